use anyhow::Context;
use clap::Parser;
use planogram_engine::config::Command;
use planogram_engine::core::export;
use planogram_engine::utils::error::ErrorSeverity;
use planogram_engine::utils::{logger, validation::Validate};
use planogram_engine::{
    CategoryId, CliConfig, EngineConfig, GridSize, JsonFileStore, NewProduct, PlanogramError,
    PlanogramId, PlanogramService, ProductId, ProductPatch, UserId,
};

type Service = PlanogramService<JsonFileStore, JsonFileStore>;

enum Output {
    Json(serde_json::Value),
    Text(String),
}

fn load_config(cli: &CliConfig) -> anyhow::Result<EngineConfig> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("failed to load config file '{}'", path.display()))?,
        None => EngineConfig::default(),
    };

    // 應用命令列覆蓋設定
    if let Some(data_dir) = &cli.data_dir {
        config.store.data_dir = data_dir.clone();
    }
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    if cli.json_logs {
        config.logging.json = true;
    }

    config.validate().context("invalid configuration")?;
    Ok(config)
}

async fn execute(
    service: &Service,
    user: &UserId,
    command: Command,
) -> planogram_engine::Result<Output> {
    let planogram = match command {
        Command::CategoryAdd { name } => {
            let category = service.register_category(user, &name).await?;
            return Ok(Output::Json(serde_json::to_value(category)?));
        }
        Command::CategoryDelete { category } => {
            service
                .delete_category(user, &CategoryId::from(category.clone()))
                .await?;
            return Ok(Output::Text(format!("Deleted category {}\n", category)));
        }
        Command::Create {
            category,
            rows,
            cols,
        } => {
            let grid_size = rows.zip(cols).map(|(rows, cols)| GridSize { rows, cols });
            service
                .create(user, &CategoryId::from(category), grid_size)
                .await?
        }
        Command::Show { category } => service.get(user, &CategoryId::from(category)).await?,
        Command::Resize {
            planogram,
            rows,
            cols,
            expect_version,
        } => {
            service
                .resize_grid(user, &PlanogramId::from(planogram), rows, cols, expect_version)
                .await?
        }
        Command::AddProduct {
            planogram,
            name,
            mrp,
            gp,
            facings,
            positions,
            expect_version,
        } => {
            let product = NewProduct {
                name,
                mrp,
                gp,
                facings,
                positions,
            };
            service
                .add_product(user, &PlanogramId::from(planogram), product, expect_version)
                .await?
        }
        Command::UpdateProduct {
            planogram,
            product,
            name,
            mrp,
            gp,
            expect_version,
        } => {
            let patch = ProductPatch { name, mrp, gp };
            service
                .update_product(
                    user,
                    &PlanogramId::from(planogram),
                    &ProductId::from(product),
                    patch,
                    expect_version,
                )
                .await?
        }
        Command::DeleteProduct {
            planogram,
            product,
            expect_version,
        } => {
            service
                .delete_product(
                    user,
                    &PlanogramId::from(planogram),
                    &ProductId::from(product),
                    expect_version,
                )
                .await?
        }
        Command::Positions {
            planogram,
            product,
            positions,
            expect_version,
        } => {
            service
                .update_product_positions(
                    user,
                    &PlanogramId::from(planogram),
                    &ProductId::from(product),
                    positions,
                    expect_version,
                )
                .await?
        }
        Command::Facings {
            planogram,
            product,
            facings,
            expect_version,
        } => {
            service
                .update_facings(
                    user,
                    &PlanogramId::from(planogram),
                    &ProductId::from(product),
                    facings,
                    expect_version,
                )
                .await?
        }
        Command::Export {
            planogram,
            format,
            products,
        } => {
            let planogram = service
                .get_by_id(user, &PlanogramId::from(planogram))
                .await?;
            let table = if products {
                export::product_sheet(&planogram, format)?
            } else {
                export::layout_table(&planogram, format)?
            };
            return Ok(Output::Text(table));
        }
    };

    Ok(Output::Json(serde_json::to_value(planogram)?))
}

fn exit_code(error: &PlanogramError) -> i32 {
    match error.severity() {
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();
    let user = match cli.require_user() {
        Ok(user) => UserId::from(user),
        Err(e) => e.exit(),
    };

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {:#}", e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 初始化日誌
    if config.logging.json {
        logger::init_json_logger(&config.logging.level);
    } else {
        logger::init_cli_logger(&config.logging.level);
    }

    tracing::debug!("Engine config: {:?}", config);
    tracing::info!("📁 Using data directory: {}", config.store.data_dir);

    let store = JsonFileStore::new(&config.store.data_dir);
    let service = PlanogramService::with_policy(store.clone(), store, config.engine_policy());

    match execute(&service, &user, cli.command).await {
        Ok(Output::Json(value)) => {
            let rendered = serde_json::to_string_pretty(&value)
                .context("failed to render result as JSON")?;
            println!("{}", rendered);
        }
        Ok(Output::Text(text)) => print!("{}", text),
        Err(e) => {
            tracing::error!(
                "❌ Command failed: {} (code: {}, category: {:?}, severity: {:?})",
                e,
                e.code(),
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            std::process::exit(exit_code(&e));
        }
    }

    Ok(())
}
