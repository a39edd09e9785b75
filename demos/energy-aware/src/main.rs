use std::error::Error;
use std::time::Instant;

use clap::Parser;
use serde::Serialize;

use dslab_clock::log_info;
use dslab_cloudsim::core::config::SimulationConfig;
use dslab_cloudsim::core::energy_accumulator::EnergySample;
use dslab_cloudsim::core::report::SimulationReport;
use dslab_cloudsim::simulation::CloudSimulation;

const DEFAULT_SCENARIO: &str = include_str!("../energy_aware.yaml");

fn init_logger() {
    use env_logger::Builder;
    use std::io::Write;
    Builder::from_default_env()
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .init();
}

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Path to simulation config (the built-in five host scenario is used if not set)
    #[clap(short, long)]
    config: Option<String>,

    /// Path to output CSV file with datacenter power samples
    #[clap(short, long, default_value = "power_data.csv")]
    output: String,

    /// Path to output JSON file with full simulation report
    #[clap(short, long)]
    report: Option<String>,
}

#[derive(Serialize)]
struct PowerRecord {
    #[serde(rename = "Time(s)")]
    time: f64,
    #[serde(rename = "Power(W)")]
    power: f64,
}

fn write_power_data(path: &str, samples: &[EnergySample]) -> Result<(), Box<dyn Error>> {
    let mut writer = csv::Writer::from_path(path)?;
    for sample in samples {
        writer.serialize(PowerRecord {
            time: sample.time,
            power: sample.power,
        })?;
    }
    writer.flush()?;
    Ok(())
}

fn print_results(report: &SimulationReport) {
    println!("\n========== ENERGY-AWARE SCHEDULING RESULTS ==========");
    println!(
        "Total Energy: {:.2} Wh ({:.2} kWh)",
        report.total_energy_wh, report.total_energy_kwh
    );
    println!("Avg Power: {:.2} W", report.average_power);
    println!("Simulation Time: {:.1} sec", report.end_time);
    println!(
        "\nCloudlets Completed: {}/{} ({:.1}%)",
        report.finished_cloudlets, report.submitted_cloudlets, report.completion_percentage
    );
    if report.stalled_cloudlets > 0 || report.failed_cloudlets > 0 {
        println!(
            "Cloudlets Stalled: {}, Failed: {}",
            report.stalled_cloudlets, report.failed_cloudlets
        );
    }
    for host in &report.hosts {
        println!(
            "{}: {:.2} Wh, {} vms{}",
            host.name,
            host.energy_consumed,
            host.vms,
            if host.failed { " (failed)" } else { "" }
        );
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    init_logger();
    let args = Args::parse();

    let sim_config = match &args.config {
        Some(path) => SimulationConfig::from_file(path)?,
        None => SimulationConfig::from_yaml(DEFAULT_SCENARIO)?,
    };
    let mut cloud_sim = CloudSimulation::from_config(sim_config)?;

    let t = Instant::now();
    cloud_sim.run();
    log_info!(
        cloud_sim.context(),
        "processed {} ticks in {:.2?}",
        cloud_sim.tick_count(),
        t.elapsed()
    );

    let report = cloud_sim.report();
    print_results(&report);

    write_power_data(&args.output, &report.samples)?;
    println!("Power data saved to {}", args.output);
    if let Some(path) = &args.report {
        std::fs::write(path, report.to_json()?)?;
        println!("Report saved to {}", path);
    }
    Ok(())
}
