use clap::{Args, Parser, Subcommand, ValueEnum};
use rega_types::{DocumentType, PersonDraft, Range, Role, UserId};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "rega")]
#[command(about = "Offline-first field registration client")]
pub struct Cli {
    /// Path to rega.toml
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start a session as the given user
    Login { user_id: UserId },

    /// Register a person under the signed-in Registrador's block
    Register(RegisterArgs),

    /// Show the next number a Registrador would stamp
    NextNumber {
        /// Defaults to the signed-in user
        user_id: Option<UserId>,
    },

    /// List records not yet acknowledged by the hub
    Pending,

    /// Download-merge then upload (or only one direction)
    Sync {
        #[arg(long, conflicts_with = "down")]
        up: bool,
        #[arg(long)]
        down: bool,
    },

    /// Download users, departments and the range pool
    Refresh,

    /// Grant the next block of the global pool
    AssignGlobal { user_id: UserId },

    /// Grant a catalogue interval such as 101-200
    AssignRange { user_id: UserId, range: Range },

    /// Change a user's role, clearing any assigned block
    SetRole { user_id: UserId, role: Role },

    /// Inspect or change the global range pool
    #[command(subcommand)]
    Pool(PoolCommand),
}

#[derive(Subcommand, Debug)]
pub enum PoolCommand {
    /// Show candidate intervals and the selected one
    Show,
    /// Make an interval the active global pool
    Select { range: Range },
}

#[derive(Args, Debug)]
pub struct RegisterArgs {
    #[arg(long, value_enum, default_value = "cc")]
    pub tipo: DocumentKind,
    #[arg(long)]
    pub documento: String,
    #[arg(long)]
    pub nombres: String,
    #[arg(long)]
    pub apellidos: String,
    #[arg(long, default_value = "")]
    pub celular: String,
    #[arg(long, default_value = "")]
    pub correo: String,
    #[arg(long, default_value = "")]
    pub ubicacion: String,
    #[arg(long, default_value = "")]
    pub direccion: String,
    #[arg(long, default_value = "")]
    pub vereda: String,
    #[arg(long, default_value = "")]
    pub departamento: String,
    #[arg(long, default_value = "")]
    pub municipio: String,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocumentKind {
    /// Tarjeta de identidad
    Ti,
    /// Cédula de ciudadanía
    Cc,
    /// Registro civil
    Rc,
    /// Pasaporte
    Pasaporte,
}

impl From<DocumentKind> for DocumentType {
    fn from(kind: DocumentKind) -> Self {
        match kind {
            DocumentKind::Ti => Self::TarjetaIdentidad,
            DocumentKind::Cc => Self::CedulaCiudadania,
            DocumentKind::Rc => Self::RegistroCivil,
            DocumentKind::Pasaporte => Self::Pasaporte,
        }
    }
}

impl From<RegisterArgs> for PersonDraft {
    fn from(args: RegisterArgs) -> Self {
        Self {
            tipo_documento: args.tipo.into(),
            numero_documento: args.documento,
            nombres: args.nombres,
            apellidos: args.apellidos,
            celular: args.celular,
            correo: args.correo,
            ubicacion: args.ubicacion,
            direccion: args.direccion,
            vereda: args.vereda,
            departamento: args.departamento,
            municipio: args.municipio,
        }
    }
}
