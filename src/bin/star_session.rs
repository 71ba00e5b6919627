//! 星型拓扑会话
//!
//! 按剧本（或内置默认剧本）驱动一个星型网络会话，输出活动日志、指标与可视化事件

use clap::Parser;
use startopo_rs::demo::{build_session, demo_scenario};
use startopo_rs::session::{ScenarioSpec, SessionConfig};
use startopo_rs::sim::SimTime;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::process;

/// 最后一个动作之后额外运行的时间，足够让批量流量与恢复爬坡走完
const DEFAULT_TAIL_MS: u64 = 30_000;

#[derive(Debug, Parser)]
#[command(name = "star-session", about = "星型拓扑会话：按剧本驱动集线器与终端设备")]
struct Args {
    /// 剧本 JSON；缺省使用内置剧本
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// 会话配置 JSON（优先级低于剧本里的 session 字段与命令行参数）
    #[arg(long)]
    config: Option<PathBuf>,

    /// 随机数种子
    #[arg(long)]
    seed: Option<u64>,

    /// 动画速度 1..=5
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
    speed: Option<u8>,

    /// 终端设备数量
    #[arg(long)]
    devices: Option<usize>,

    /// 关闭环境抖动
    #[arg(long)]
    no_ambient: bool,

    /// 仿真运行到多少毫秒；缺省为最后一个动作之后 30 秒
    #[arg(long)]
    until_ms: Option<u64>,

    /// 输出可视化事件 JSON
    #[arg(long)]
    viz_json: Option<PathBuf>,

    /// 导出活动日志文本；缺省打印到 stdout
    #[arg(long)]
    log_out: Option<PathBuf>,
}

fn load_config(args: &Args, scenario: &ScenarioSpec) -> Result<SessionConfig, String> {
    let mut cfg = match (&scenario.session, &args.config) {
        (Some(cfg), _) => cfg.clone(),
        (None, Some(path)) => {
            let raw = fs::read_to_string(path)
                .map_err(|e| format!("read config {}: {e}", path.display()))?;
            SessionConfig::from_json(&raw)
                .map_err(|e| format!("load config {}: {e}", path.display()))?
        }
        (None, None) => SessionConfig::default(),
    };
    if let Some(seed) = args.seed {
        cfg.seed = seed;
    }
    if let Some(speed) = args.speed {
        cfg.speed = speed;
    }
    if let Some(devices) = args.devices {
        cfg.devices = devices;
    }
    if args.no_ambient {
        cfg.ambient_jitter = false;
    }
    cfg.validate().map_err(|e| format!("invalid session config: {e}"))?;
    Ok(cfg)
}

fn load_scenario(args: &Args) -> Result<ScenarioSpec, String> {
    match &args.scenario {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .map_err(|e| format!("read scenario {}: {e}", path.display()))?;
            ScenarioSpec::from_json(&raw).map_err(|e| e.to_string())
        }
        None => Ok(demo_scenario()),
    }
}

fn run(args: Args) -> Result<(), String> {
    let scenario = load_scenario(&args)?;
    let cfg = load_config(&args, &scenario)?;
    scenario.validate(cfg.devices).map_err(|e| e.to_string())?;

    let (mut sim, mut session) = build_session(cfg, args.viz_json.is_some());
    scenario.schedule_into(&mut sim);

    let until = match args.until_ms {
        Some(ms) => SimTime::from_millis(ms),
        None => scenario
            .last_at()
            .saturating_add(SimTime::from_millis(DEFAULT_TAIL_MS)),
    };
    sim.run_until(until, &mut session);

    match &args.log_out {
        Some(path) => {
            let mut file = fs::File::create(path)
                .map_err(|e| format!("create log file {}: {e}", path.display()))?;
            session
                .export_log(&mut file, sim.now())
                .map_err(|e| e.to_string())?;
            eprintln!("wrote activity log to {}", path.display());
        }
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            session
                .export_log(&mut out, sim.now())
                .map_err(|e| e.to_string())?;
        }
    }

    let m = session.metrics(sim.now());
    println!(
        "done @ {}, packets_sent={}, packets_collided={}, hub={}, latency_ms={:.1}, collision_rate_pct={:.1}, bandwidth_pct={:.1}, online={}",
        sim.now(),
        m.packets_sent,
        m.packets_collided,
        m.hub_status_label,
        m.latency_ms,
        m.collision_rate_pct,
        m.total_bandwidth_pct,
        m.online_devices
    );

    if let Some(path) = args.viz_json {
        if let Some(v) = session.viz.take() {
            let json = serde_json::to_string_pretty(&v.events)
                .map_err(|e| format!("serialize viz events: {e}"))?;
            fs::write(&path, json).map_err(|e| format!("write viz json: {e}"))?;
            eprintln!("wrote viz events to {}", path.display());
        }
    }
    Ok(())
}

fn main() {
    // 初始化 tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    if let Err(e) = run(args) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
