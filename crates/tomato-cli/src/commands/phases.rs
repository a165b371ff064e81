use tomato_core::{prettify_duration, Config};

pub fn run(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let phases = config.phases()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&phases)?);
        return Ok(());
    }

    if phases.is_empty() {
        println!("no phases configured");
        return Ok(());
    }
    for (i, phase) in phases.iter().enumerate() {
        println!(
            "{:>2}. {:<12} {}",
            i + 1,
            phase.kind.label(),
            prettify_duration(phase.duration)
        );
    }
    let total: u64 = phases.iter().map(|p| p.duration).sum();
    println!("cycle length: {}", prettify_duration(total));
    Ok(())
}
