use aquasim::logging::{level_for_verbosity, init_logging, parse_log_level, LogConfig, LogOutput};
use aquasim::scenario::ScenarioConfig;
use aquasim::simulation::SimulationEngine;
use clap::{Arg, ArgMatches, Command};
use std::str::FromStr;
use tracing::info;

fn main() {
    // コマンドライン引数の解析
    let matches = Command::new("aquasim")
        .version("0.1.0")
        .about("深海養殖 ロボット監視シミュレーション")
        .long_about("水槽内のAUVスウォームと屋外UAVによる魚群監視を\n\
                     ティック駆動でシミュレーションします。")
        .arg(
            Arg::new("scenario")
                .short('s')
                .long("scenario")
                .value_name("FILE")
                .help("シナリオファイル(.yaml)のパスを指定")
        )
        .arg(
            Arg::new("info")
                .short('i')
                .long("info")
                .action(clap::ArgAction::SetTrue)
                .help("シナリオの情報のみ表示して終了")
                .conflicts_with("test")
        )
        .arg(
            Arg::new("test")
                .short('t')
                .long("test")
                .action(clap::ArgAction::SetTrue)
                .help("組み込みの標準シナリオで実行")
                .conflicts_with("scenario")
        )
        .arg(
            Arg::new("realtime")
                .long("realtime")
                .action(clap::ArgAction::SetTrue)
                .help("sim.tick_interval_ms 間隔で実時間実行")
        )
        .arg(
            Arg::new("report")
                .short('o')
                .long("report")
                .value_name("FILE")
                .help("結果レポートをYAMLで書き出す")
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(clap::ArgAction::Count)
                .help("詳細出力レベル (-v: DEBUG, -vv: TRACE)")
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .default_value("info")
                .help("ログレベル (trace, debug, info, warn, error)")
        )
        .arg(
            Arg::new("log-output")
                .long("log-output")
                .value_name("OUTPUT")
                .default_value("console")
                .value_parser(["console", "file", "both"])
                .help("ログ出力先")
        )
        .arg(
            Arg::new("log-dir")
                .long("log-dir")
                .value_name("DIR")
                .default_value("logs")
                .help("ログファイルのディレクトリ")
        )
        .get_matches();

    println!("深海養殖シミュレーション - aquasim v0.1.0");
    println!();

    let log_config = log_config_from(&matches);
    let _log_guard = match init_logging(&log_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("ログ初期化エラー: {}", e);
            std::process::exit(1);
        }
    };

    let result = if matches.get_flag("test") {
        println!("=== 標準シナリオモード ===");
        execute_scenario(ScenarioConfig::default(), &matches)
    } else if let Some(scenario_path) = matches.get_one::<String>("scenario") {
        run_scenario(scenario_path, &matches)
    } else {
        // デフォルト動作: 使い方を表示
        show_default_help();
        Ok(())
    };

    if let Err(e) = result {
        eprintln!("エラー: {}", e);
        std::process::exit(1);
    }
}

fn log_config_from(matches: &ArgMatches) -> LogConfig {
    let base_level = matches
        .get_one::<String>("log-level")
        .map(|s| parse_log_level(s))
        .unwrap_or(tracing::Level::INFO);
    let output = matches
        .get_one::<String>("log-output")
        .and_then(|s| LogOutput::from_str(s).ok())
        .unwrap_or(LogOutput::Console);

    LogConfig {
        level: level_for_verbosity(base_level, matches.get_count("verbose")),
        output,
        log_dir: matches
            .get_one::<String>("log-dir")
            .cloned()
            .unwrap_or_else(|| "logs".to_string()),
        ..LogConfig::default()
    }
}

/// シナリオファイルを読み込んで実行
fn run_scenario(scenario_path: &str, matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let scenario = ScenarioConfig::from_file(scenario_path)?;
    info!("シナリオファイル読み込み完了: {}", scenario_path);

    // 情報表示のみの場合
    if matches.get_flag("info") {
        scenario.print_summary();
        return Ok(());
    }

    execute_scenario(scenario, matches)
}

/// シナリオの実行
fn execute_scenario(scenario: ScenarioConfig, matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    scenario.print_summary();
    println!();

    let mut simulation = SimulationEngine::new(scenario);

    if matches.get_flag("realtime") {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()?;
        runtime.block_on(simulation.run_realtime())?;
    } else {
        simulation.run()?;
    }

    let report = simulation.report();
    println!();
    report.print_summary();

    if let Some(path) = matches.get_one::<String>("report") {
        std::fs::write(path, report.to_yaml()?)?;
        println!();
        println!("レポートを書き出しました: {}", path);
    }

    Ok(())
}

/// デフォルトヘルプとシナリオ一覧を表示
fn show_default_help() {
    println!("使用方法:");
    println!("  aquasim [オプション]");
    println!();
    println!("オプション:");
    println!("  -s, --scenario <FILE>   シナリオファイルを指定して実行");
    println!("  -i, --info              シナリオ情報のみ表示");
    println!("  -t, --test              組み込みの標準シナリオで実行");
    println!("      --realtime          実時間でティックを進める");
    println!("  -o, --report <FILE>     結果レポートをYAMLで書き出す");
    println!("  -v, --verbose           詳細出力 (複数指定で詳細レベル上昇)");
    println!("      --log-output <OUT>  ログ出力先 (console, file, both)");
    println!("  -h, --help              このヘルプを表示");
    println!();
    println!("利用可能なシナリオファイル:");
    println!("  scenarios/tank_patrol.yaml   - 標準的な水槽巡回");
    println!("  scenarios/low_battery.yaml   - 低バッテリー帰還の確認");
    println!("  scenarios/crowded_tank.yaml  - 多数機体での反発挙動");
    println!();
    println!("例:");
    println!("  aquasim -s scenarios/tank_patrol.yaml");
    println!("  aquasim -s scenarios/low_battery.yaml -v -o report.yaml");
    println!("  aquasim -s scenarios/tank_patrol.yaml --realtime");
    println!("  aquasim --test");
}
