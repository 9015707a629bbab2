//! `lightfps optimize`: one page load, one engine run, virtual time after.

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use tracing::{info, warn};

use lightfps_config::{ConfigLoader, ConfigValidator, EngineConfig, Settings};
use lightfps_engine::{Engine, RunReport, Trigger};
use lightfps_page::html::{parse_html, serialize};
use lightfps_page::{DirResources, Window};
use lightfps_runloop::RunLoop;

use crate::cli::{OptimizeArgs, split_pair};
use crate::cmd_settings::default_store_path;

pub(crate) fn handle_optimize(args: OptimizeArgs) -> anyhow::Result<()> {
    let source = std::fs::read_to_string(&args.page)
        .with_context(|| format!("reading {}", args.page.display()))?;
    let settings = load_settings(&args)?;
    let config = load_config(args.config.as_deref())?;

    let assets = match &args.assets {
        Some(dir) => dir.clone(),
        None => args
            .page
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
    };

    let mut doc = parse_html(&source);
    doc.finish_loading();
    let mut rl = RunLoop::new(Window::new(doc).with_resources(DirResources::new(assets)));
    rl.run_until_idle()?;

    let engine = Engine::new(config, settings)?;
    let report = match engine.trigger(&mut rl)? {
        Trigger::Ran(report) => report,
        Trigger::Deferred => bail!("document was still loading"),
    };
    rl.run_until_idle()?;

    if args.hidden {
        info!("Hiding page");
        rl.window_mut().set_hidden(true);
        rl.run_until_idle()?;
    }
    if args.advance_ms > 0 {
        rl.advance_ms(args.advance_ms)?;
    }

    print_report(&report, &rl, &engine, args.json)?;

    let output = args.output.clone().unwrap_or_else(|| output_path(&args.page));
    std::fs::write(&output, serialize(rl.document()))
        .with_context(|| format!("writing {}", output.display()))?;
    info!("Wrote {}", output.display());

    engine.teardown(&mut rl);
    Ok(())
}

fn load_settings(args: &OptimizeArgs) -> anyhow::Result<Settings> {
    let mut settings = match &args.settings {
        Some(path) => ConfigLoader::load_settings(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => {
            let store = default_store_path();
            if store.exists() {
                ConfigLoader::load_settings(&store)
                    .with_context(|| format!("loading settings from {}", store.display()))?
            } else {
                Settings::default()
            }
        }
    };
    for pair in &args.overrides {
        let (key, value) = split_pair(pair)?;
        settings.set_key(key, value)?;
    }
    if !settings.auto_optimize {
        warn!("autoOptimize is off; the engine will not change the page");
    }
    Ok(settings)
}

pub(crate) fn load_config(path: Option<&Path>) -> anyhow::Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let config = ConfigLoader::load(path)
        .with_context(|| format!("loading engine config from {}", path.display()))?;

    let validation = ConfigValidator::validate(&config)?;
    for warning in &validation.warnings {
        warn!("{}: {}", warning.path, warning.message);
    }
    if !validation.is_valid() {
        let errors: Vec<String> = validation
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.path, e.message))
            .collect();
        bail!("invalid engine config:\n  {}", errors.join("\n  "));
    }
    Ok(config)
}

fn output_path(page: &Path) -> PathBuf {
    let stem = page
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "page".to_string());
    page.with_file_name(format!("{stem}.lightfps.html"))
}

fn print_report(
    report: &RunReport,
    rl: &RunLoop,
    engine: &Engine,
    json: bool,
) -> anyhow::Result<()> {
    let metrics = rl.metrics_snapshot();
    if json {
        let value = serde_json::json!({
            "report": report,
            "metrics": metrics,
            "trackerActive": engine.tracker().is_active(),
            "frameSyncs": engine.media().frame_sync_count(),
            "audioGraphs": engine.audio().graph_count(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    print!("{report}");
    println!(
        "virtual time {} ms: {} timers, {} frames, {} events",
        metrics.now_ms, metrics.timers_fired, metrics.frames_run, metrics.events_dispatched
    );
    println!(
        "tracker observer {}, {} frame sync loop(s), {} audio graph(s)",
        if engine.tracker().is_active() { "on" } else { "off" },
        engine.media().frame_sync_count(),
        engine.audio().graph_count()
    );
    Ok(())
}
