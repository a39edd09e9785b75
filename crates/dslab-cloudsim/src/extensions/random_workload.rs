//! Seeded generator of random cloudlets.

use rand::distributions::Uniform;

use dslab_clock::SimulationContext;

use crate::core::cloudlet::Cloudlet;
use crate::core::common::CloudletId;
use crate::core::config::RandomCloudletsConfig;
use crate::core::utilization_model::utilization_model_from_value;

/// Cloudlet which should be submitted at the specified time.
pub struct CloudletSubmission {
    pub time: f64,
    pub cloudlet: Cloudlet,
}

/// Generates cloudlets with uniformly distributed length, PE count and submission time
/// using the simulation random number generator, so the workload is reproducible for a given seed.
///
/// Cloudlet ids are assigned sequentially starting from `first_id`.
pub fn generate_cloudlets(
    config: &RandomCloudletsConfig,
    first_id: CloudletId,
    ctx: &mut SimulationContext,
) -> Vec<CloudletSubmission> {
    let length_dist = Uniform::new_inclusive(config.min_length, config.max_length);
    let pes_dist = Uniform::new_inclusive(config.min_pes, config.max_pes);
    let window = config.submission_window.unwrap_or(0.);
    (0..config.count)
        .map(|i| {
            let length = ctx.sample_from_distribution(&length_dist);
            let pes = ctx.sample_from_distribution(&pes_dist);
            let time = if window > 0. { ctx.gen_range(0. ..=window) } else { 0. };
            let cloudlet = Cloudlet::new(first_id + i, length, pes)
                .with_cpu_model(utilization_model_from_value(config.cpu_utilization))
                .with_ram_model(utilization_model_from_value(config.ram_utilization))
                .with_bw_model(utilization_model_from_value(config.bw_utilization));
            CloudletSubmission { time, cloudlet }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use dslab_clock::SimulationClock;

    use super::generate_cloudlets;
    use crate::core::config::RandomCloudletsConfig;

    fn config() -> RandomCloudletsConfig {
        RandomCloudletsConfig {
            count: 10,
            min_length: 1000.,
            max_length: 5000.,
            min_pes: 1,
            max_pes: 4,
            cpu_utilization: Some(0.5),
            ram_utilization: None,
            bw_utilization: None,
            submission_window: Some(10.),
        }
    }

    fn generate(seed: u64) -> Vec<(u32, f64, u32, f64)> {
        let mut clock = SimulationClock::<()>::new(seed, 1.);
        let mut ctx = clock.create_context("workload");
        generate_cloudlets(&config(), 100, &mut ctx)
            .into_iter()
            .map(|s| (s.cloudlet.id, s.cloudlet.length(), s.cloudlet.pes(), s.time))
            .collect()
    }

    #[test]
    fn test_generated_cloudlets_are_in_range() {
        let generated = generate(123);
        assert_eq!(generated.len(), 10);
        for (i, (id, length, pes, time)) in generated.into_iter().enumerate() {
            assert_eq!(id, 100 + i as u32);
            assert!((1000. ..=5000.).contains(&length));
            assert!((1..=4).contains(&pes));
            assert!((0. ..=10.).contains(&time));
        }
    }

    #[test]
    fn test_generation_is_reproducible() {
        assert_eq!(generate(7), generate(7));
        assert_ne!(generate(7), generate(8));
    }
}
