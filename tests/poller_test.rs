use async_trait::async_trait;
use mfc_control::acquisition::{
    create_shared_monitor_state, FlowPoller, PollerCommand, PollerStatus, SharedMonitorState,
};
use mfc_control::config::ControllerConfig;
use mfc_control::datalog::{header_for, CsvLogWriter};
use mfc_control::device::{share_gateway, DeviceError, DeviceGateway};
use mfc_control::mfc::MassFlowController;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::tempdir;
use tokio::sync::{mpsc, watch};
use tokio::time::{self, Instant};

/// What the gateway saw, shared with the test body
#[derive(Default)]
struct Record {
    cycle_starts: Vec<Instant>,
    writes: Vec<(String, f64)>,
}

/// Gateway returning a fixed raw value. The first controller read marks the
/// start of a cycle; reads of the second controller fail on scripted cycles.
struct RecordingGateway {
    raw: f64,
    failing_cycles: HashSet<usize>,
    cycle: usize,
    record: Arc<Mutex<Record>>,
}

#[async_trait]
impl DeviceGateway for RecordingGateway {
    async fn write(&mut self, channel: &str, value: f64) -> Result<(), DeviceError> {
        self.record
            .lock()
            .unwrap()
            .writes
            .push((channel.to_string(), value));
        Ok(())
    }

    async fn read(&mut self, channel: &str) -> Result<f64, DeviceError> {
        if channel == "AIN0" {
            self.cycle += 1;
            self.record.lock().unwrap().cycle_starts.push(Instant::now());
        }
        if channel == "AIN1" && self.failing_cycles.contains(&self.cycle) {
            return Err(DeviceError::Read {
                channel: channel.to_string(),
                message: "simulated failure".to_string(),
            });
        }
        Ok(self.raw)
    }

    async fn close(&mut self) -> Result<(), DeviceError> {
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "recording"
    }
}

struct Bench {
    poller: FlowPoller,
    state: SharedMonitorState,
    record: Arc<Mutex<Record>>,
    log_path: PathBuf,
}

fn bench(dir: &Path, failing_cycles: &[usize], interval: Duration, backoff: Duration) -> Bench {
    let record = Arc::new(Mutex::new(Record::default()));
    let gateway = share_gateway(Box::new(RecordingGateway {
        raw: 10.0,
        failing_cycles: failing_cycles.iter().copied().collect(),
        cycle: 0,
        record: record.clone(),
    }));

    let configs = [
        ControllerConfig::new("A", "TDAC0", "AIN0", 2.0, 5.0, 25.0),
        ControllerConfig::new("B", "TDAC1", "AIN1", 1.0, 0.0, 0.0),
    ];
    let controllers = configs
        .iter()
        .map(|c| MassFlowController::new(c, gateway.clone()).unwrap())
        .collect();

    let log_path = dir.join("2024-01-01").join("MFC_20240101_000000.csv");
    let log = CsvLogWriter::open_log(&log_path, &header_for(["A", "B"])).unwrap();
    let state = create_shared_monitor_state(configs.iter().map(|c| (c.name.clone(), c.setpoint)));

    Bench {
        poller: FlowPoller::new(controllers, log, state.clone(), interval, backoff),
        state,
        record,
        log_path,
    }
}

fn data_rows(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .skip(1)
        .map(str::to_string)
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_one_row_per_cycle_and_failures_do_not_stop_the_loop() {
    let dir = tempdir().unwrap();
    let bench = bench(
        dir.path(),
        &[3],
        Duration::from_secs(1),
        Duration::from_millis(500),
    );
    let (_command_tx, command_rx) = mpsc::unbounded_channel();
    let (stop_tx, stop_rx) = watch::channel(false);

    let task = tokio::spawn(bench.poller.run(command_rx, stop_rx));
    time::sleep(Duration::from_millis(5500)).await;
    stop_tx.send(true).unwrap();
    task.await.unwrap().unwrap();

    let starts = bench.record.lock().unwrap().cycle_starts.clone();
    assert!(starts.len() >= 5, "only {} cycles ran", starts.len());
    for pair in starts.windows(2) {
        assert!(pair[1] - pair[0] >= Duration::from_secs(1));
    }

    // The failed cycle wrote nothing, the others one row each
    let rows = data_rows(&bench.log_path);
    assert_eq!(rows.len(), starts.len() - 1);
    for row in &rows {
        let fields: Vec<&str> = row.split(',').collect();
        assert_eq!(fields.len(), 5);
        assert_eq!(&fields[1..], &["25", "25", "0", "10"]);
    }

    let state = bench.state.read().await;
    assert_eq!(state.failures(), 1);
    assert_eq!(state.cycles(), rows.len() as u64);
    assert_eq!(state.flow("A"), Some(25));
    assert!(state.last_error().unwrap().contains("simulated failure"));
    assert_eq!(state.status(), PollerStatus::Stopped);
}

#[tokio::test(start_paused = true)]
async fn test_apply_setpoints_command() {
    let dir = tempdir().unwrap();
    let bench = bench(dir.path(), &[], Duration::from_secs(1), Duration::from_secs(1));
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (_stop_tx, stop_rx) = watch::channel(false);

    let task = tokio::spawn(bench.poller.run(command_rx, stop_rx));
    time::sleep(Duration::from_millis(500)).await;

    command_tx
        .send(PollerCommand::ApplySetpoints(vec![
            ("A".to_string(), 1505.0),
            ("B".to_string(), 1500.0),
        ]))
        .unwrap();
    time::sleep(Duration::from_secs(1)).await;
    command_tx.send(PollerCommand::Stop).unwrap();
    task.await.unwrap().unwrap();

    let writes = bench.record.lock().unwrap().writes.clone();
    assert_eq!(
        writes,
        vec![("TDAC0".to_string(), 750.0), ("TDAC1".to_string(), 1500.0)]
    );

    let state = bench.state.read().await;
    assert_eq!(state.setpoint("A"), Some(1505.0));
    assert_eq!(state.setpoint("B"), Some(1500.0));

    // The row logged after the change carries the new setpoints
    let rows = data_rows(&bench.log_path);
    let last = rows.last().unwrap();
    assert!(last.ends_with(",1505,25,1500,10"), "{}", last);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_interrupts_backoff() {
    let dir = tempdir().unwrap();
    let bench = bench(
        dir.path(),
        &(1..100).collect::<Vec<_>>(),
        Duration::from_secs(10),
        Duration::from_secs(10),
    );
    let (_command_tx, command_rx) = mpsc::unbounded_channel();
    let (stop_tx, stop_rx) = watch::channel(false);

    let task = tokio::spawn(bench.poller.run(command_rx, stop_rx));
    time::sleep(Duration::from_secs(1)).await;
    assert_eq!(bench.state.read().await.status(), PollerStatus::Backoff);

    let started = Instant::now();
    stop_tx.send(true).unwrap();
    time::timeout(Duration::from_secs(2), task)
        .await
        .expect("poller did not stop during backoff")
        .unwrap()
        .unwrap();
    assert!(started.elapsed() < Duration::from_secs(2));
    assert!(data_rows(&bench.log_path).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_log_write_failure_does_not_stop_the_loop() {
    let dir = tempdir().unwrap();
    let bench = bench(
        dir.path(),
        &[],
        Duration::from_secs(1),
        Duration::from_millis(250),
    );
    let log_dir = bench.log_path.parent().unwrap().to_path_buf();
    let (_command_tx, command_rx) = mpsc::unbounded_channel();
    let (stop_tx, stop_rx) = watch::channel(false);

    let task = tokio::spawn(bench.poller.run(command_rx, stop_rx));
    time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(data_rows(&bench.log_path).len(), 2);

    // The next append finds no file to open
    fs::remove_dir_all(&log_dir).unwrap();
    time::sleep(Duration::from_secs(1)).await;
    {
        let state = bench.state.read().await;
        assert_eq!(state.failures(), 1);
        assert!(state.last_error().unwrap().contains("data log"));
    }

    fs::create_dir_all(&log_dir).unwrap();
    fs::write(&bench.log_path, "").unwrap();
    time::sleep(Duration::from_secs(1)).await;
    stop_tx.send(true).unwrap();
    task.await.unwrap().unwrap();

    // The restored file received the following cycle
    let contents = fs::read_to_string(&bench.log_path).unwrap();
    assert_eq!(contents.lines().count(), 1);
    assert!(contents.trim_end().ends_with(",25,25,0,10"));

    let state = bench.state.read().await;
    assert_eq!(state.failures(), 1);
    assert_eq!(state.cycles(), 4);
    assert_eq!(state.status(), PollerStatus::Stopped);
}
