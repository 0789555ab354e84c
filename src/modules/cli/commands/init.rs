//! Init command implementation

use clap::Args;
use neo4j_mcp_config::env::vars;
use neo4j_mcp_core::{defaults, Neo4jMcpError};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

const ENV_EXAMPLE_FILE: &str = ".env.example";
const CONFIG_FILE: &str = "neo4j-mcp.yaml";

/// Init command arguments
#[derive(Args, Debug)]
pub struct InitCommand {
    /// Output directory
    #[arg(short, long, default_value = ".")]
    pub output: PathBuf,

    /// Overwrite existing files
    #[arg(long)]
    pub force: bool,
}

impl InitCommand {
    /// Execute the init command
    pub async fn execute(&self) -> Result<(), Neo4jMcpError> {
        let written = self.write_files()?;
        for path in &written {
            info!("Created: {}", path.display());
        }

        println!("\nneo4j-mcp configuration initialized!");
        println!("\nNext steps:");
        println!("  1. Copy {} to .env and set NEO4J_USERNAME/NEO4J_PASSWORD", ENV_EXAMPLE_FILE);
        println!("  2. Adjust {} if needed", CONFIG_FILE);
        println!("  3. Verify with: neo4j-mcp check -c {}", CONFIG_FILE);
        println!("  4. Serve with:  neo4j-mcp run -c {}", CONFIG_FILE);

        Ok(())
    }

    /// Write both files, refusing to overwrite unless `--force` is set
    fn write_files(&self) -> Result<Vec<PathBuf>, Neo4jMcpError> {
        let output_dir = Path::new(&self.output);
        if !output_dir.exists() {
            fs::create_dir_all(output_dir)?;
        }

        let files = [
            (output_dir.join(ENV_EXAMPLE_FILE), generate_env_example()),
            (output_dir.join(CONFIG_FILE), generate_config()),
        ];

        if !self.force {
            if let Some((existing, _)) = files.iter().find(|(path, _)| path.exists()) {
                return Err(Neo4jMcpError::ConfigFile(format!(
                    "{} already exists; use --force to overwrite",
                    existing.display()
                )));
            }
        }

        let mut written = Vec::with_capacity(files.len());
        for (path, content) in files {
            fs::write(&path, content)?;
            written.push(path);
        }
        Ok(written)
    }
}

/// Generate .env.example content
fn generate_env_example() -> String {
    format!(
        r#"# Neo4j connection
{host}={default_host}
{port}={default_port}
{http_port}={default_http_port}
{database}={default_database}

# Leave both unset to connect without authentication
{username}=neo4j
{password}=change-me

# bolt, bolt+s, neo4j or neo4j+s
{scheme}={default_scheme}
{encrypted}=false

# Pool
{pool}={default_pool}
{acquire}={default_acquire}
{connect}={default_connect}
{lifetime}={default_lifetime}
"#,
        host = vars::HOST,
        port = vars::PORT,
        http_port = vars::HTTP_PORT,
        database = vars::DATABASE,
        username = vars::USERNAME,
        password = vars::PASSWORD,
        scheme = vars::URI_SCHEME,
        encrypted = vars::ENCRYPTED,
        pool = vars::MAX_POOL_SIZE,
        acquire = vars::ACQUIRE_TIMEOUT,
        connect = vars::CONNECTION_TIMEOUT,
        lifetime = vars::MAX_CONNECTION_LIFETIME,
        default_host = defaults::HOST,
        default_port = defaults::PORT,
        default_http_port = defaults::HTTP_PORT,
        default_database = defaults::DATABASE,
        default_scheme = defaults::URI_SCHEME,
        default_pool = defaults::MAX_POOL_SIZE,
        default_acquire = defaults::ACQUIRE_TIMEOUT_SECS,
        default_connect = defaults::CONNECTION_TIMEOUT_SECS,
        default_lifetime = defaults::MAX_CONNECTION_LIFETIME_SECS,
    )
}

/// Generate the YAML settings file
fn generate_config() -> String {
    format!(
        r#"# neo4j-mcp settings
# Environment variables and command-line flags take precedence over this file.

neo4j:
  host: {host}
  port: {port}
  database: {database}
  username: "{{{{ env.{username} }}}}"
  password: "{{{{ env.{password} }}}}"

server:
  transport: stdio
  host: localhost
  port: 3000
"#,
        host = defaults::HOST,
        port = defaults::PORT,
        database = defaults::DATABASE,
        username = vars::USERNAME,
        password = vars::PASSWORD,
    )
}
