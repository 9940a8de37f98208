use super::Parser;

#[derive(Parser, Debug)]
#[command(name = "portal-auth", about = "CPF login and registration service")]
pub struct Cli {
    /// Path of a settings file, without or with the `.toml` extension.
    #[arg(long)]
    pub settings: Option<String>,
}
