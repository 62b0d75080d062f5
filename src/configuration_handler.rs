use crate::configuration::Configuration;
use clap::Parser;

/// Settings from command line flags, falling back to the environment (and a
/// `.env` file in the working directory).
#[derive(Debug, Clone, Parser)]
#[command(name = "interview_slots", about = "Interview slot reservation service")]
pub struct ConfigurationHandler {
    /// Port the HTTP server listens on.
    #[arg(long, env = "PORT", default_value = "3001")]
    port: String,

    /// PostgreSQL connection URL. Without it slots are kept in memory only.
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    #[arg(long, env = "DATABASE_POOL_SIZE", default_value_t = 8)]
    database_pool_size: u32,

    /// Accept blocks whose start and end time are equal (creating no slots).
    #[arg(long, env = "ALLOW_EMPTY_BLOCKS")]
    allow_empty_blocks: bool,

    #[arg(long, env = "MAX_SLOTS_PER_BLOCK", default_value_t = 500)]
    max_slots_per_block: usize,
}

impl ConfigurationHandler {
    pub fn parse_arguments() -> Self {
        dotenvy::dotenv().ok();
        Self::parse()
    }
}

impl Configuration for ConfigurationHandler {
    fn port(&self) -> String {
        self.port.clone()
    }

    fn database_url(&self) -> Option<String> {
        self.database_url.clone()
    }

    fn database_pool_size(&self) -> u32 {
        self.database_pool_size
    }

    fn allow_empty_blocks(&self) -> bool {
        self.allow_empty_blocks
    }

    fn max_slots_per_block(&self) -> usize {
        self.max_slots_per_block
    }
}
