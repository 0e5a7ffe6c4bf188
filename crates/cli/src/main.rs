use std::path::{Path, PathBuf};
use std::process;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use serde_json::Value;

use cubescan_core::capture::camera_manager::CameraManager;
use cubescan_core::capture::domain::snapshot_writer::SnapshotWriter;
use cubescan_core::capture::infrastructure::jpeg_snapshot_writer::JpegSnapshotWriter;
use cubescan_core::control::domain::command_transport::CommandTransport;
use cubescan_core::control::infrastructure::command_solver::CommandSolver;
use cubescan_core::control::infrastructure::serial_transport::{SerialConfig, SerialTransport};
use cubescan_core::detection::detection_pipeline::DetectionPipeline;
use cubescan_core::pipeline::capture_state_use_case::CaptureStateUseCase;
use cubescan_core::pipeline::cube_state::{default_state_path, load_state, save_json};
use cubescan_core::pipeline::solve_use_case::SolveUseCase;
use cubescan_core::regions::region_store::{default_region_path, RegionStore};
use cubescan_core::shared::camera_id::CameraId;
use cubescan_core::shared::constants::{DEFAULT_CAMERA_IDS, SNAPSHOT_JPEG_QUALITY};

/// Scan a cube with two cameras, solve it, and drive the solving robot.
#[derive(Parser)]
#[command(name = "cubescan")]
struct Cli {
    /// Camera ids to open (comma-separated).
    #[arg(long, value_delimiter = ',', global = true)]
    cameras: Option<Vec<CameraId>>,

    /// Region configuration file.
    #[arg(long, global = true)]
    regions: Option<PathBuf>,

    /// Where the last captured cube state is kept.
    #[arg(long, global = true)]
    state: Option<PathBuf>,

    /// How long to wait for live frames before sampling (milliseconds).
    #[arg(long, default_value = "3000", global = true)]
    settle_ms: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show backend, device and error for each camera.
    Status,
    /// Classify every configured sticker region.
    Detect {
        /// Only detect on this camera.
        #[arg(long)]
        camera: Option<CameraId>,
    },
    /// Capture a full cube state and store it.
    Capture,
    /// Solve the stored (or a freshly captured) cube state.
    Solve {
        /// Capture a new state before solving.
        #[arg(long)]
        capture_first: bool,

        /// Send the solution over the serial link.
        #[arg(long)]
        send: bool,

        /// Solver program; called with the 54-letter facelet string as last argument.
        #[arg(long)]
        solver: PathBuf,

        /// Extra arguments passed to the solver before the facelets.
        #[arg(long = "solver-arg", allow_hyphen_values = true)]
        solver_args: Vec<String>,
    },
    /// Send a raw command over the serial link.
    Send {
        /// Command text; a newline is appended.
        command: String,
    },
    /// Save the current frame of one camera as JPEG.
    Snapshot {
        #[arg(long)]
        camera: CameraId,

        /// Output JPEG file.
        output: PathBuf,
    },
    /// Print, replace or reset the sticker regions.
    Regions {
        /// Restore the default layout.
        #[arg(long, conflicts_with = "set")]
        reset: bool,

        /// Limit --reset or --set to one camera.
        #[arg(long)]
        camera: Option<CameraId>,

        /// JSON file with new regions: a list for --camera, else an object keyed by camera id.
        #[arg(long)]
        set: Option<PathBuf>,
    },
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let cameras = cli.cameras.clone().unwrap_or_else(|| DEFAULT_CAMERA_IDS.to_vec());
    if cameras.is_empty() {
        return Err("At least one camera id is required".into());
    }
    let settle = Duration::from_millis(cli.settle_ms);

    match &cli.command {
        Command::Status => run_status(&cameras, settle),
        Command::Detect { camera } => run_detect(&cli, &cameras, *camera, settle),
        Command::Capture => run_capture(&cli, &cameras, settle),
        Command::Solve {
            capture_first,
            send,
            solver,
            solver_args,
        } => run_solve(&cli, &cameras, settle, *capture_first, *send, solver, solver_args),
        Command::Send { command } => run_send(command),
        Command::Snapshot { camera, output } => run_snapshot(&cameras, *camera, output, settle),
        Command::Regions { reset, camera, set } => {
            run_regions(&cli, &cameras, *reset, *camera, set.as_deref())
        }
    }
}

fn run_status(cameras: &[CameraId], settle: Duration) -> Result<(), Box<dyn std::error::Error>> {
    let manager = open_cameras(cameras, settle)?;
    let status = manager.status();
    manager.close_all();
    print_json(&status)
}

fn run_detect(
    cli: &Cli,
    cameras: &[CameraId],
    camera: Option<CameraId>,
    settle: Duration,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(id) = camera {
        ensure_configured(cameras, id)?;
    }
    let store = open_regions(cli, cameras)?;
    let manager = open_cameras(cameras, settle)?;
    let pipeline = DetectionPipeline::default();
    let snapshot = store.snapshot();

    let result = match camera {
        Some(id) => {
            let regions = snapshot.get(&id).map(Vec::as_slice).unwrap_or_default();
            serde_json::to_value(pipeline.detect_camera(&manager, id, regions))?
        }
        None => serde_json::to_value(pipeline.detect_all(&manager, &snapshot))?,
    };
    manager.close_all();
    print_json(&result)
}

fn run_capture(cli: &Cli, cameras: &[CameraId], settle: Duration) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_regions(cli, cameras)?;
    let manager = open_cameras(cameras, settle)?;
    let state = CaptureStateUseCase::default().execute(&manager, &store.snapshot());
    manager.close_all();

    save_json(&state_path(cli)?, &state)?;
    print_json(&state)
}

fn run_solve(
    cli: &Cli,
    cameras: &[CameraId],
    settle: Duration,
    capture_first: bool,
    send: bool,
    solver: &Path,
    solver_args: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    let state_path = state_path(cli)?;
    let state = if capture_first {
        let store = open_regions(cli, cameras)?;
        let manager = open_cameras(cameras, settle)?;
        let state = CaptureStateUseCase::default().execute(&manager, &store.snapshot());
        manager.close_all();
        save_json(&state_path, &state)?;
        state
    } else {
        load_state(&state_path)?
    };

    let transport: Option<Box<dyn CommandTransport>> = if send {
        Some(Box::new(SerialTransport::new(SerialConfig::from_process_env()?)))
    } else {
        None
    };
    let solver = CommandSolver::new(solver).with_args(solver_args.to_vec());
    let outcome = SolveUseCase::new(Box::new(solver), transport).execute(&state, send)?;

    save_json(&state_path.with_file_name("last_solution.json"), &outcome)?;
    print_json(&outcome)
}

fn run_send(command: &str) -> Result<(), Box<dyn std::error::Error>> {
    let transport = SerialTransport::new(SerialConfig::from_process_env()?);
    let response = transport.send(command)?;
    print_json(&response)
}

fn run_snapshot(
    cameras: &[CameraId],
    camera: CameraId,
    output: &Path,
    settle: Duration,
) -> Result<(), Box<dyn std::error::Error>> {
    ensure_configured(cameras, camera)?;
    let manager = open_cameras(&[camera], settle)?;
    let frame = manager.get_frame(camera);
    manager.close_all();

    if frame.is_placeholder() {
        log::warn!("Camera {camera} has no live frame; saving the placeholder");
    }
    JpegSnapshotWriter::new(SNAPSHOT_JPEG_QUALITY).write(output, &frame)?;
    eprintln!("Saved {}x{} frame to {}", frame.width(), frame.height(), output.display());
    Ok(())
}

fn run_regions(
    cli: &Cli,
    cameras: &[CameraId],
    reset: bool,
    camera: Option<CameraId>,
    set: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_regions(cli, cameras)?;

    if reset {
        store.reset(camera)?;
    } else if let Some(path) = set {
        let candidate: Value = serde_json::from_str(&std::fs::read_to_string(path)?)?;
        match camera {
            Some(id) => {
                store.set_camera(id, &candidate)?;
            }
            None => {
                store.set_many(&candidate)?;
            }
        }
    }

    if let Some(path) = store.path() {
        log::info!("Regions stored in {}", path.display());
    }
    let snapshot = store.snapshot();
    match camera {
        Some(id) => print_json(&snapshot.get(&id)),
        None => print_json(&*snapshot),
    }
}

fn open_regions(cli: &Cli, cameras: &[CameraId]) -> Result<RegionStore, Box<dyn std::error::Error>> {
    let path = match &cli.regions {
        Some(path) => path.clone(),
        None => default_region_path()?,
    };
    Ok(RegionStore::open(path, cameras)?)
}

fn state_path(cli: &Cli) -> Result<PathBuf, Box<dyn std::error::Error>> {
    cli.state
        .clone()
        .or_else(default_state_path)
        .ok_or_else(|| "Could not determine where to store cube state; pass --state".into())
}

/// Starts the cameras and waits until each shows a live frame or `settle`
/// elapses, whichever comes first.
fn open_cameras(cameras: &[CameraId], settle: Duration) -> Result<CameraManager, Box<dyn std::error::Error>> {
    let manager = CameraManager::new(cameras)?;
    let deadline = Instant::now() + settle;
    while Instant::now() < deadline {
        if cameras.iter().all(|&id| !manager.get_frame(id).is_placeholder()) {
            break;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    for (id, status) in manager.status() {
        if let Some(error) = &status.error {
            log::warn!("Camera {id}: {error}");
        }
    }
    Ok(manager)
}

fn ensure_configured(cameras: &[CameraId], camera: CameraId) -> Result<(), Box<dyn std::error::Error>> {
    if cameras.contains(&camera) {
        Ok(())
    } else {
        Err(format!("Camera {camera} is not configured").into())
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
