mod chart;
mod collage;
mod config;
mod errors;
mod indicators;
mod series;

fn main() -> anyhow::Result<()> {
    // Step 1: Resolve Settings
    println!("\n--- Step 1: Reading Settings ---");
    let config = config::load(config::SETTINGS_FILE);

    // Step 2: Render Charts
    println!("\n--- Step 2: Rendering Charts ---");
    if let Err(e) = chart::run(&config) {
        eprintln!("Error rendering charts: {}", e);
    }

    // Step 3: Assemble Collage
    println!("\n--- Step 3: Assembling Collage ---");
    if let Err(e) = collage::run() {
        eprintln!("Error assembling collage: {}", e);
    }

    Ok(())
}
