use approx::assert_abs_diff_eq;
use sugars::{rc, refcell};

use dslab_clock::RunOutcome;

use dslab_cloudsim::core::cloudlet::{Cloudlet, CloudletStatus};
use dslab_cloudsim::core::config::SimulationConfig;
use dslab_cloudsim::core::error::CloudSimError;
use dslab_cloudsim::core::failure_injector::HostFailurePolicy;
use dslab_cloudsim::core::power_model::{ConstantPowerModel, LinearPowerModel};
use dslab_cloudsim::core::utilization_model::ConstantUtilization;
use dslab_cloudsim::simulation::CloudSimulation;

fn name_wrapper(file_name: &str) -> String {
    format!("test-configs/{}", file_name)
}

fn base_config() -> SimulationConfig {
    SimulationConfig::from_file(&name_wrapper("config.yaml")).unwrap()
}

#[test]
// Cloudlets of 10000 and 8000 MI run on two hosts with one 1000 MIPS PE each, the first host fails at t=3.
// The first cloudlet keeps its remaining 7000 MI while the second one runs to completion at t=8.
// Both hosts draw 100 W until t=3, then only the second host is counted.
fn test_frozen_cloudlet_does_not_progress() {
    let mut cloud_sim = CloudSimulation::new(base_config()).unwrap();
    for name in ["h0", "h1"] {
        cloud_sim
            .add_host(name, &[1000.], 1024, 100, 1000, Box::new(LinearPowerModel::new(50., 100.)))
            .unwrap();
    }
    cloud_sim.submit_vm(1000., 1, 512, 10, 100).unwrap();
    cloud_sim.submit_vm(1000., 1, 512, 10, 100).unwrap();
    assert_eq!(cloud_sim.submit_cloudlet(Cloudlet::new(0, 10000., 1)).unwrap(), 0);
    assert_eq!(cloud_sim.submit_cloudlet(Cloudlet::new(1, 8000., 1)).unwrap(), 1);
    cloud_sim.schedule_host_failure(3., 0).unwrap();

    cloud_sim.steps(3);
    assert!(cloud_sim.datacenter().host(0).unwrap().is_failed());
    assert_abs_diff_eq!(cloud_sim.datacenter().cloudlet(0).unwrap().remaining_length(), 7000., epsilon = 1e-6);

    let frozen_log = rc!(refcell!(Vec::new()));
    let frozen_log_clone = frozen_log.clone();
    cloud_sim.add_tick_listener("frozen", move |dc, _tick| {
        let cloudlet = dc.cloudlet(0).unwrap();
        let utilization = dc.host(0).unwrap().cpu_percent_utilization();
        frozen_log_clone
            .borrow_mut()
            .push((cloudlet.status(), cloudlet.remaining_length(), utilization));
    });
    assert_eq!(cloud_sim.run(), RunOutcome::Stopped);
    assert_eq!(cloud_sim.current_time(), 8.);

    let frozen_log = frozen_log.borrow();
    assert_eq!(frozen_log.len(), 5);
    for &(status, remaining_length, utilization) in frozen_log.iter() {
        assert_eq!(status, CloudletStatus::Executing);
        assert_abs_diff_eq!(remaining_length, 7000., epsilon = 1e-6);
        assert_eq!(utilization, 0.);
    }

    let dc = cloud_sim.datacenter();
    assert_abs_diff_eq!(dc.cloudlet(1).unwrap().finish_time().unwrap(), 8., epsilon = 1e-9);
    assert!(dc.is_stalled(dc.cloudlet(0).unwrap()));
    assert_abs_diff_eq!(cloud_sim.report().total_energy_wh, (3. * 200. + 5. * 100.) / 3600., epsilon = 1e-9);
}

#[test]
// Two VMs with one 1000 MIPS PE each run cloudlets of 4000 and 6000 MI on a single host, which fails at t=5.
// The first cloudlet finishes at t=4, the second one completes 5000 MI and then freezes.
// Host power is 300 W while both VMs are busy and 187.5 W at the last tick (half load),
// so the energy is (4 * 300 + 187.5) / 3600 Wh.
fn test_host_failure_freezes_cloudlets() {
    let config = SimulationConfig::from_file(&name_wrapper("host_failure.yaml")).unwrap();
    let mut cloud_sim = CloudSimulation::from_config(config).unwrap();

    let outcome = cloud_sim.run();
    assert_eq!(outcome, RunOutcome::Stopped);
    assert_eq!(cloud_sim.current_time(), 5.);

    let dc = cloud_sim.datacenter();
    let first = dc.cloudlet(0).unwrap();
    assert_eq!(first.status(), CloudletStatus::Finished);
    assert_eq!(first.vm_id(), Some(0));
    assert_abs_diff_eq!(first.finish_time().unwrap(), 4., epsilon = 1e-9);

    let second = dc.cloudlet(1).unwrap();
    assert_eq!(second.vm_id(), Some(1));
    assert_eq!(second.status(), CloudletStatus::Executing);
    assert_abs_diff_eq!(second.finished_length(), 5000., epsilon = 1e-6);
    assert!(dc.is_stalled(second));
    assert!(dc.host(0).unwrap().is_failed());

    let report = cloud_sim.report();
    assert_eq!(report.submitted_cloudlets, 2);
    assert_eq!(report.finished_cloudlets, 1);
    assert_eq!(report.stalled_cloudlets, 1);
    assert_abs_diff_eq!(report.completion_percentage, 50.);
    assert_abs_diff_eq!(report.total_energy_wh, 1387.5 / 3600., epsilon = 1e-9);
    assert_abs_diff_eq!(report.hosts[0].energy_consumed, 1387.5 / 3600., epsilon = 1e-9);
    assert_eq!(report.samples.len(), 5);
}

#[test]
// The same scenario with the policy which fails the unfinished cloudlets of a failed host.
fn test_host_failure_fails_cloudlets() {
    let mut config = SimulationConfig::from_file(&name_wrapper("host_failure.yaml")).unwrap();
    config.on_host_failure = HostFailurePolicy::Fail;
    let mut cloud_sim = CloudSimulation::from_config(config).unwrap();

    assert_eq!(cloud_sim.run(), RunOutcome::Stopped);
    let second = cloud_sim.datacenter().cloudlet(1).unwrap();
    assert_eq!(second.status(), CloudletStatus::Failed);
    assert_eq!(second.finish_time(), None);

    let report = cloud_sim.report();
    assert_eq!(report.failed_cloudlets, 1);
    assert_eq!(report.stalled_cloudlets, 0);
}

#[test]
// Four equal cloudlets share a single 1000 MIPS PE, so each of them gets 250 MIPS.
fn test_time_shared_fairness() {
    let mut cloud_sim = CloudSimulation::new(base_config()).unwrap();
    cloud_sim
        .add_host("h", &[1000.], 1024, 100, 1000, Box::new(LinearPowerModel::new(50., 100.)))
        .unwrap();
    cloud_sim.submit_vm(1000., 1, 512, 10, 100).unwrap();
    for id in 0..4 {
        assert_eq!(cloud_sim.submit_cloudlet(Cloudlet::new(id, 10000., 1)).unwrap(), 0);
    }

    cloud_sim.step();
    for cloudlet in cloud_sim.datacenter().cloudlets() {
        assert_eq!(cloudlet.status(), CloudletStatus::Executing);
        assert_abs_diff_eq!(cloudlet.finished_length(), 250., epsilon = 1e-9);
    }
    assert_abs_diff_eq!(cloud_sim.datacenter().host(0).unwrap().cpu_percent_utilization(), 1.);
}

#[test]
// Cloudlet progress is bounded by the VM capacity: 2 PEs * 500 MIPS for 10 seconds.
fn test_progress_is_bounded_by_capacity() {
    let mut cloud_sim = CloudSimulation::new(base_config()).unwrap();
    cloud_sim
        .add_host("h", &[1000., 1000.], 1024, 100, 1000, Box::new(ConstantPowerModel::new(100.)))
        .unwrap();
    cloud_sim.submit_vm(500., 2, 512, 10, 100).unwrap();
    for id in 0..3 {
        cloud_sim.submit_cloudlet(Cloudlet::new(id, 1e6, 2)).unwrap();
    }

    cloud_sim.run_for_duration(10.);
    let processed: f64 = cloud_sim.datacenter().cloudlets().map(|c| c.finished_length()).sum();
    assert!(processed <= 1000. * 10. + 1e-6);
    assert_abs_diff_eq!(processed, 10000., epsilon = 1e-6);
    // half of the host capacity is used
    assert_abs_diff_eq!(cloud_sim.datacenter().host(0).unwrap().cpu_percent_utilization(), 0.5);
}

#[test]
// Tick listeners observe the state after the processing and energy updates:
// energy never decreases and allocated resources never exceed host capacity.
fn test_energy_is_monotonic_and_capacity_is_respected() {
    let config = SimulationConfig::from_file(&name_wrapper("random_workload.yaml")).unwrap();
    let mut cloud_sim = CloudSimulation::from_config(config).unwrap();
    let energy_log = rc!(refcell!(Vec::new()));
    let violations = rc!(refcell!(0));

    let energy_log_clone = energy_log.clone();
    let violations_clone = violations.clone();
    cloud_sim.add_tick_listener("checker", move |dc, tick| {
        energy_log_clone.borrow_mut().push((tick.time, dc.energy().total_energy()));
        for host in dc.hosts().values() {
            if host.ram_allocated() > host.ram_capacity()
                || host.bw_allocated() > host.bw_capacity()
                || host.storage_allocated() > host.storage_capacity()
                || host.allocated_pes() > host.pe_count()
            {
                *violations_clone.borrow_mut() += 1;
            }
            if host.is_failed() && host.cpu_percent_utilization() != 0. {
                *violations_clone.borrow_mut() += 1;
            }
        }
    });
    cloud_sim.run();

    let energy_log = energy_log.borrow();
    assert!(!energy_log.is_empty());
    for pair in energy_log.windows(2) {
        assert!(pair[1].0 > pair[0].0);
        assert!(pair[1].1 >= pair[0].1);
    }
    assert_eq!(*violations.borrow(), 0);
}

#[test]
// The run completes and every cloudlet ends up finished or stalled on the failed host.
fn test_random_workload_completes() {
    let config = SimulationConfig::from_file(&name_wrapper("random_workload.yaml")).unwrap();
    let mut cloud_sim = CloudSimulation::from_config(config).unwrap();
    assert_eq!(cloud_sim.run(), RunOutcome::Stopped);

    let report = cloud_sim.report();
    assert_eq!(report.submitted_cloudlets, 30);
    assert_eq!(report.finished_cloudlets + report.stalled_cloudlets, 30);
    assert!(report.hosts[1].failed);
    assert_eq!(cloud_sim.datacenter().pending_cloudlets(), 0);
    for cloudlet in cloud_sim.datacenter().cloudlets() {
        if let Some(finish_time) = cloudlet.finish_time() {
            assert!(finish_time <= report.end_time);
            assert!(finish_time > cloudlet.start_time().unwrap());
        }
    }
}

#[test]
// Two runs with the same seed produce identical results.
fn test_runs_are_deterministic() {
    let run = || {
        let config = SimulationConfig::from_file(&name_wrapper("random_workload.yaml")).unwrap();
        let mut cloud_sim = CloudSimulation::from_config(config).unwrap();
        cloud_sim.run();
        cloud_sim.report().to_json().unwrap()
    };
    assert_eq!(run(), run());
}

#[test]
// A VM which does not fit stays unplaced, cloudlets routed to it never progress.
fn test_unplaced_vm() {
    let mut cloud_sim = CloudSimulation::new(base_config()).unwrap();
    cloud_sim
        .add_host("h", &[1000., 1000.], 1024, 100, 1000, Box::new(ConstantPowerModel::new(100.)))
        .unwrap();
    let result = cloud_sim.submit_vm(1000., 4, 512, 10, 100);
    assert!(matches!(result, Err(CloudSimError::NoSuitableHost { vm_id: 0 })));
    assert_eq!(cloud_sim.datacenter().unplaced_vms(), vec![0]);

    // no placed VMs, the cloudlet goes to the default (first submitted) VM
    assert_eq!(cloud_sim.submit_cloudlet(Cloudlet::new(0, 1000., 1)).unwrap(), 0);
    assert_eq!(cloud_sim.run(), RunOutcome::Stopped);
    assert_eq!(cloud_sim.current_time(), 0.);

    let report = cloud_sim.report();
    assert_eq!(report.stalled_cloudlets, 1);
    assert_eq!(report.finished_cloudlets, 0);
    assert_eq!(report.unplaced_vms, vec![0]);
}

#[test]
// Cloudlet submitted at t=2.5 starts at 2.5 and needs one second at 1000 MIPS.
fn test_delayed_submission() {
    let mut cloud_sim = CloudSimulation::new(base_config()).unwrap();
    cloud_sim
        .add_host("h", &[1000.], 1024, 100, 1000, Box::new(LinearPowerModel::new(50., 100.)))
        .unwrap();
    cloud_sim.submit_vm(1000., 1, 512, 10, 100).unwrap();
    cloud_sim.submit_cloudlet_at(2.5, Cloudlet::new(0, 1000., 1)).unwrap();

    assert_eq!(cloud_sim.run(), RunOutcome::Stopped);
    let cloudlet = cloud_sim.datacenter().cloudlet(0).unwrap();
    assert_eq!(cloudlet.status(), CloudletStatus::Finished);
    assert_abs_diff_eq!(cloudlet.start_time().unwrap(), 2.5);
    assert_abs_diff_eq!(cloudlet.finish_time().unwrap(), 3.5, epsilon = 1e-9);
    assert_eq!(cloud_sim.current_time(), 4.);

    // idle during (0, 2.5], busy during (2.5, 3], half loaded during (3, 4]
    let expected = (2.5 * 50. + 0.5 * 100. + 1. * 75.) / 3600.;
    assert_abs_diff_eq!(cloud_sim.report().total_energy_wh, expected, epsilon = 1e-9);
}

#[test]
// Cloudlets with partial CPU utilization progress proportionally slower.
fn test_partial_cpu_utilization() {
    let mut cloud_sim = CloudSimulation::new(base_config()).unwrap();
    cloud_sim
        .add_host("h", &[1000.; 4], 4096, 100, 1000, Box::new(LinearPowerModel::new(75., 300.)))
        .unwrap();
    cloud_sim.submit_vm(1000., 2, 512, 10, 100).unwrap();
    let cloudlet = Cloudlet::new(0, 2000., 2).with_cpu_model(Box::new(ConstantUtilization::new(0.4)));
    cloud_sim.submit_cloudlet(cloudlet).unwrap();

    cloud_sim.run();
    // 2 PEs * 1000 MIPS * 0.4 = 800 MI per second
    let cloudlet = cloud_sim.datacenter().cloudlet(0).unwrap();
    assert_abs_diff_eq!(cloudlet.finish_time().unwrap(), 2.5, epsilon = 1e-9);
    assert_eq!(cloud_sim.current_time(), 3.);
}

#[test]
// A single-PE cloudlet on a 4-PE VM runs on one PE only: 4000 MI at 1000 MIPS.
// The host is loaded by a quarter, so it draws 75 + 225 * 0.25 = 131.25 W.
fn test_cloudlet_uses_only_required_pes() {
    let mut cloud_sim = CloudSimulation::new(base_config()).unwrap();
    cloud_sim
        .add_host("h", &[1000.; 4], 4096, 100, 1000, Box::new(LinearPowerModel::new(75., 300.)))
        .unwrap();
    cloud_sim.submit_vm(1000., 4, 512, 10, 100).unwrap();
    cloud_sim.submit_cloudlet(Cloudlet::new(0, 4000., 1)).unwrap();

    cloud_sim.step();
    assert_abs_diff_eq!(cloud_sim.datacenter().host(0).unwrap().cpu_percent_utilization(), 0.25);

    assert_eq!(cloud_sim.run(), RunOutcome::Stopped);
    let cloudlet = cloud_sim.datacenter().cloudlet(0).unwrap();
    assert_abs_diff_eq!(cloudlet.finish_time().unwrap(), 4., epsilon = 1e-9);
    assert_eq!(cloud_sim.current_time(), 4.);
    assert_abs_diff_eq!(cloud_sim.report().total_energy_wh, 4. * 131.25 / 3600., epsilon = 1e-9);
}

#[test]
// The run stops at the time horizon if cloudlets are still executing.
// The cloudlet scheduled after the horizon is counted as submitted but never routed.
fn test_horizon_reached() {
    let mut config = base_config();
    config.max_time = 10.;
    let mut cloud_sim = CloudSimulation::new(config).unwrap();
    cloud_sim
        .add_host("h", &[1000.], 1024, 100, 1000, Box::new(ConstantPowerModel::new(100.)))
        .unwrap();
    cloud_sim.submit_vm(1000., 1, 512, 10, 100).unwrap();
    cloud_sim.submit_cloudlet(Cloudlet::new(0, 1e9, 1)).unwrap();
    cloud_sim.submit_cloudlet_at(20., Cloudlet::new(1, 1000., 1)).unwrap();

    assert_eq!(cloud_sim.run(), RunOutcome::HorizonReached);
    assert_eq!(cloud_sim.current_time(), 10.);
    assert_eq!(cloud_sim.outcome(), Some(RunOutcome::HorizonReached));
    let report = cloud_sim.report();
    assert_eq!(report.submitted_cloudlets, 2);
    assert_eq!(report.pending_cloudlets, 1);
    assert_eq!(report.cloudlets.len(), 1);
    assert_eq!(report.finished_cloudlets, 0);
    assert_eq!(report.stalled_cloudlets, 0);
    assert_abs_diff_eq!(report.completion_percentage, 0.);
    assert_abs_diff_eq!(report.total_energy_wh, 1000. / 3600., epsilon = 1e-9);
    assert_abs_diff_eq!(report.average_power, 100., epsilon = 1e-9);
}

#[test]
fn test_invalid_input() {
    let mut config = base_config();
    config.scheduling_interval = -1.;
    assert!(matches!(
        CloudSimulation::new(config),
        Err(CloudSimError::InvalidConfiguration(_))
    ));

    let mut cloud_sim = CloudSimulation::new(base_config()).unwrap();
    assert!(matches!(
        cloud_sim.schedule_host_failure(1., 3),
        Err(CloudSimError::UnknownHost(3))
    ));
    assert!(matches!(
        cloud_sim.submit_vm(1000., 0, 512, 10, 100),
        Err(CloudSimError::InvalidConfiguration(_))
    ));
    assert!(matches!(
        cloud_sim.add_host("h", &[], 1024, 100, 1000, Box::new(ConstantPowerModel::new(100.))),
        Err(CloudSimError::InvalidConfiguration(_))
    ));
    for (ram, bw, storage) in [(0, 100, 1000), (1024, 0, 1000), (1024, 100, 0)] {
        assert!(matches!(
            cloud_sim.add_host("h", &[1000.], ram, bw, storage, Box::new(ConstantPowerModel::new(100.))),
            Err(CloudSimError::InvalidConfiguration(_))
        ));
    }
    assert!(cloud_sim.datacenter().hosts().is_empty());
    // no VMs at all
    assert!(matches!(
        cloud_sim.submit_cloudlet(Cloudlet::new(0, 1000., 1)),
        Err(CloudSimError::NoCandidateVm { cloudlet_id: 0 })
    ));
    assert!(matches!(
        cloud_sim.submit_cloudlet(Cloudlet::new(1, 0., 1)),
        Err(CloudSimError::InvalidConfiguration(_))
    ));
}

#[test]
fn test_config_from_file() {
    let config = SimulationConfig::from_file(&name_wrapper("random_workload.yaml")).unwrap();
    assert_eq!(config.seed, 42);
    assert_eq!(config.scheduling_interval, 0.5);
    assert_eq!(config.number_of_hosts(), 4);

    let cloud_sim = CloudSimulation::from_config(config).unwrap();
    let dc = cloud_sim.datacenter();
    let names: Vec<&str> = dc.hosts().values().map(|h| h.name()).collect();
    assert_eq!(names, vec!["host-0", "host-1", "host-2", "host-3"]);
    assert_eq!(dc.vms().len(), 6);
    assert!(dc.unplaced_vms().is_empty());
    // worst fit spreads VMs over the hosts
    assert_eq!(dc.host(0).unwrap().vms().len(), 2);
    assert_eq!(dc.host(3).unwrap().vms().len(), 1);

    assert!(SimulationConfig::from_file(&name_wrapper("missing.yaml")).is_err());
}
