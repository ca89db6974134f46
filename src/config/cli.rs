use crate::core::LayoutFormat;
use crate::domain::model::Position;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "planogram")]
#[command(about = "Lay out category products on a planogram shelf grid")]
pub struct CliConfig {
    /// Authenticated user the commands run as (required)
    #[arg(long, global = true)]
    pub user: Option<String>,

    /// Path to TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override `store.data_dir` from the config
    #[arg(long, global = true)]
    pub data_dir: Option<String>,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl CliConfig {
    /// clap 不允許 global 參數設為 required，改在解析後檢查
    pub fn require_user(&self) -> Result<&str, clap::Error> {
        match self.user.as_deref().map(str::trim) {
            Some(user) if !user.is_empty() => Ok(user),
            _ => Err(Self::command().error(
                ErrorKind::MissingRequiredArgument,
                "the following required arguments were not provided: --user <USER>",
            )),
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Register a category owned by the current user
    CategoryAdd {
        #[arg(long)]
        name: String,
    },
    /// Delete a category together with its planogram
    CategoryDelete {
        #[arg(long)]
        category: String,
    },
    /// Create the planogram of a category
    Create {
        #[arg(long)]
        category: String,
        #[arg(long, requires = "cols")]
        rows: Option<u32>,
        #[arg(long, requires = "rows")]
        cols: Option<u32>,
    },
    /// Show the planogram of a category
    Show {
        #[arg(long)]
        category: String,
    },
    Resize {
        #[arg(long)]
        planogram: String,
        #[arg(long)]
        rows: u32,
        #[arg(long)]
        cols: u32,
        #[arg(long)]
        expect_version: Option<u64>,
    },
    AddProduct {
        #[arg(long)]
        planogram: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        mrp: f64,
        #[arg(long)]
        gp: f64,
        #[arg(long, default_value = "1")]
        facings: u32,
        /// Cells as ROW:COL, comma separated (e.g. 0:0,0:1)
        #[arg(long, value_delimiter = ',')]
        positions: Vec<Position>,
        #[arg(long)]
        expect_version: Option<u64>,
    },
    /// Edit name, MRP or GP of a product
    UpdateProduct {
        #[arg(long)]
        planogram: String,
        #[arg(long)]
        product: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        mrp: Option<f64>,
        #[arg(long)]
        gp: Option<f64>,
        #[arg(long)]
        expect_version: Option<u64>,
    },
    DeleteProduct {
        #[arg(long)]
        planogram: String,
        #[arg(long)]
        product: String,
        #[arg(long)]
        expect_version: Option<u64>,
    },
    /// Replace the cells a product occupies; omit --positions to take it off the shelf
    Positions {
        #[arg(long)]
        planogram: String,
        #[arg(long)]
        product: String,
        #[arg(long, value_delimiter = ',')]
        positions: Vec<Position>,
        #[arg(long)]
        expect_version: Option<u64>,
    },
    Facings {
        #[arg(long)]
        planogram: String,
        #[arg(long)]
        product: String,
        #[arg(long)]
        facings: u32,
        #[arg(long)]
        expect_version: Option<u64>,
    },
    /// Print the shelf layout (or the product sheet) as CSV/TSV
    Export {
        #[arg(long)]
        planogram: String,
        #[arg(long, value_enum, default_value = "csv")]
        format: LayoutFormat,
        #[arg(long, help = "Export the product sheet instead of the grid")]
        products: bool,
    },
}
