//! Persons registered in the field.

use crate::{Result, TypesError, UserId};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

/// Kind of identity document a person presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DocumentType {
    #[serde(rename = "Tarjeta de identidad")]
    TarjetaIdentidad,
    #[default]
    #[serde(rename = "Cédula de ciudadanía")]
    CedulaCiudadania,
    #[serde(rename = "Registro civil")]
    RegistroCivil,
    #[serde(rename = "Pasaporte")]
    Pasaporte,
}

/// A registered person.
///
/// `numero_documento` is the merge key across replicas. `numero_asignado` is
/// the sequential number stamped from the registering user's block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    /// Remote document id, known once the backend has the record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub tipo_documento: DocumentType,
    pub numero_documento: String,
    #[serde(default)]
    pub nombres: String,
    #[serde(default)]
    pub apellidos: String,
    #[serde(default)]
    pub celular: String,
    #[serde(default)]
    pub correo: String,
    #[serde(default)]
    pub ubicacion: String,
    #[serde(default)]
    pub direccion: String,
    #[serde(default)]
    pub vereda: String,
    #[serde(default)]
    pub departamento: String,
    #[serde(default)]
    pub municipio: String,
    #[serde(deserialize_with = "number_or_string")]
    pub numero_asignado: i64,
    pub registrado_por: UserId,
    #[serde(default, with = "crate::flag")]
    pub is_synced: bool,
}

impl Person {
    /// Whether both records carry the same registration data. The remote id
    /// and the sync flag are bookkeeping and are ignored.
    #[must_use]
    pub fn same_content(&self, other: &Person) -> bool {
        let normalize = |p: &Person| Person {
            id: None,
            is_synced: false,
            ..p.clone()
        };
        normalize(self) == normalize(other)
    }

    /// Marks the record as acknowledged by the backend.
    pub fn mark_synced(&mut self, remote_id: Option<String>) {
        self.is_synced = true;
        if remote_id.is_some() {
            self.id = remote_id;
        }
    }
}

/// The data entered for a new registration, before a number is stamped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonDraft {
    #[serde(default)]
    pub tipo_documento: DocumentType,
    pub numero_documento: String,
    pub nombres: String,
    pub apellidos: String,
    #[serde(default)]
    pub celular: String,
    #[serde(default)]
    pub correo: String,
    #[serde(default)]
    pub ubicacion: String,
    #[serde(default)]
    pub direccion: String,
    #[serde(default)]
    pub vereda: String,
    #[serde(default)]
    pub departamento: String,
    #[serde(default)]
    pub municipio: String,
}

impl PersonDraft {
    /// Checks the fields the core relies on: the document number is the
    /// merge key and a record without names cannot be told apart.
    pub fn validate(&self) -> Result<()> {
        if self.numero_documento.trim().is_empty() {
            return Err(TypesError::InvalidDraft("numeroDocumento is empty".into()));
        }
        if self.nombres.trim().is_empty() {
            return Err(TypesError::InvalidDraft("nombres is empty".into()));
        }
        if self.apellidos.trim().is_empty() {
            return Err(TypesError::InvalidDraft("apellidos is empty".into()));
        }
        Ok(())
    }

    /// Stamps the draft with its number and registering user. The result is
    /// local-only until uploaded.
    #[must_use]
    pub fn into_person(self, numero_asignado: i64, registrado_por: UserId) -> Person {
        Person {
            id: None,
            tipo_documento: self.tipo_documento,
            numero_documento: self.numero_documento.trim().to_string(),
            nombres: self.nombres,
            apellidos: self.apellidos,
            celular: self.celular,
            correo: self.correo,
            ubicacion: self.ubicacion,
            direccion: self.direccion,
            vereda: self.vereda,
            departamento: self.departamento,
            municipio: self.municipio,
            numero_asignado,
            registrado_por,
            is_synced: false,
        }
    }
}

/// Older clients stored `numeroAsignado` as a string.
fn number_or_string<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<i64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(i64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("numeroAsignado is not a number: {s:?}"))),
    }
}
