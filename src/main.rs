use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use provchain_ledger::config::Config;
use provchain_ledger::dispatch::{self, Response};
use provchain_ledger::storage::MemoryStore;

#[derive(Parser)]
#[command(name = "provchain-ledger")]
#[command(about = "Perishable-goods supply chain provenance ledger CLI", long_about = None)]
struct Cli {
    /// Path to a TOML config file; falls back to defaults if absent.
    #[arg(long, default_value = "ledger.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Invoke a named ledger operation against a fresh in-memory store.
    Invoke {
        /// Operation name, e.g. createParticipant, submitGoodsReceipt.
        operation: String,
        /// Argument 0 is the JSON payload; the rest are scalar ids.
        args: Vec<String>,
    },

    /// Run the built-in produce-ship-receive-contaminate walkthrough.
    Demo,

    /// Print the resolved configuration and exit.
    PrintConfig,
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load_or_default(&cli.config);
    init_tracing(&config);

    match cli.command {
        Commands::Invoke { operation, args } => {
            let mut store = MemoryStore::new();
            let response = dispatch::dispatch(&mut store, &operation, &args);
            print_response(&response);
        }
        Commands::Demo => run_demo(),
        Commands::PrintConfig => {
            println!("{}", toml::to_string_pretty(&config)?);
        }
    }
    Ok(())
}

fn print_response(response: &Response) {
    println!("status: {}", response.status.as_u16());
    println!("message: {}", response.message);
    if let Some(payload) = &response.payload {
        match std::str::from_utf8(payload) {
            Ok(text) => println!("payload: {text}"),
            Err(_) => println!("payload: {} bytes (binary)", payload.len()),
        }
    }
}

/// Walks through spec scenarios S1-S2 against a scratch store, printing
/// every response. Exists for manual smoke-testing, not for automation.
fn run_demo() {
    let mut store = MemoryStore::new();
    let steps: &[(&str, &[&str])] = &[
        (
            "createParticipant",
            &[r#"{"ParticipantID":"A","ParticipantType":"GROWER","CompanyName":"Acme Farms","ContactEmail":"a@acme.test"}"#],
        ),
        (
            "createParticipant",
            &[r#"{"ParticipantID":"B","ParticipantType":"IMPORTER","CompanyName":"Bravo Imports","ContactEmail":"b@bravo.test"}"#],
        ),
        ("createProduct", &[r#"{"ProductID":"P1","ProductType":"coffee"}"#]),
        (
            "registerMaterial",
            &[r#"{"ParticipantID":"A","MaterialMasterID":"MA","ProductBCID":"P1","MaterialDescription":"Green coffee beans","Plant":"Farm 1","StorageLocation":"Silo A","UnitOfMeasure":"KG"}"#],
        ),
        (
            "registerMaterial",
            &[r#"{"ParticipantID":"B","MaterialMasterID":"MB","ProductBCID":"P1","MaterialDescription":"Roasted coffee beans","Plant":"Roastery 1","StorageLocation":"Warehouse B","UnitOfMeasure":"KG"}"#],
        ),
        (
            "createProductionOrder",
            &[r#"{"POID":"PO1","ParticipantID":"A","MaterialID":"MA","Quantity":100,"UnitOfMeasure":"KG"}"#],
        ),
        (
            "submitGoodsReceipt",
            &[r#"{"GRNumber":"GR1","ReceivedBy":"A","Against":"PRODUCTION ORDER","POID":"PO1","BatchNumber":"BATCH-A1","SerialNumbers":[]}"#],
        ),
        (
            "createPurchaseOrder",
            &[r#"{"POID":"PO2","RequestorID":"B","RequestorMaterialID":"MB","VendorID":"A","VendorMaterialID":"MA","VendorBatchNumber":"BATCH-A1","Quantity":40,"UnitOfMeasure":"KG","NetPrice":120.0,"Currency":"USD"}"#],
        ),
        ("createShipment", &[r#"{"ShipmentID":"S1","ProductBCID":"P1","POID":"PO2"}"#]),
        (
            "submitGoodsReceipt",
            &[r#"{"GRNumber":"GR2","ReceivedBy":"B","Against":"PURCHASE ORDER","POID":"PO2","BatchNumber":"BATCH-B1","SerialNumbers":[]}"#],
        ),
        (
            "reportContamination",
            &[r#"{"ParticipantID":"A","MaterialID":"MA","BatchNumber":"BATCH-A1"}"#],
        ),
    ];

    for (operation, args) in steps {
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        let response = dispatch::dispatch(&mut store, operation, &args);
        println!("== {operation} ==");
        print_response(&response);
    }
}
