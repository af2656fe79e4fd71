use anyhow::Result;
use nmdcapi::search::STUDY_SET;
use nmdcapi::{Client, Filter, Query, Table};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // RUST_LOG=nmdcapi=debug shows every request.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    // Configure the base URL via NMDC_API_URL or a `.nmdcrc` file.
    let client = Client::from_env()?.with_progress(true);

    let query = Query::new(STUDY_SET)
        .filter_expr(&Filter::regex("name", "soil"))
        .page_size(20)
        .fields(["id", "name", "principal_investigator"]);

    let studies = client.fetch_all(&query)?;
    let table = Table::from_records(&studies);

    println!("{}", table.columns().join("\t"));
    for row in table.rows() {
        let cells: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        println!("{}", cells.join("\t"));
    }
    Ok(())
}
