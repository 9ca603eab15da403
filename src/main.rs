use air_guitar::config::Config;
use air_guitar::osc::OscStrumSink;
use anyhow::Result;
use std::io::{self, Write};

const CONFIG_PATH: &str = "config.toml";

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "air_guitar=info".into()),
        )
        .init();

    let config = Config::load_or_default(CONFIG_PATH);
    let range = config.pitch.range;

    println!("=== Air Guitar - OSC Test ({}) ===", env!("GIT_VERSION"));
    println!("接続先: {} {}", config.osc.addr, config.osc.address);
    println!();
    println!("コマンド:");
    println!("  s n           - ピッチ n でストロークを送信 (例: s 12)");
    println!("  w             - 0〜{} を順に送信", range);
    println!("  q             - 終了");
    println!();

    let sink = OscStrumSink::from_config(&config.osc)?;

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let parts: Vec<&str> = input.split_whitespace().collect();

        if parts.is_empty() {
            continue;
        }

        match parts[0] {
            "s" if parts.len() == 2 => match parts[1].parse::<i32>() {
                Ok(pitch) => {
                    sink.send(pitch)?;
                    println!("送信しました: {}", pitch);
                }
                Err(_) => println!("整数を指定してください: {}", parts[1]),
            },
            "w" => {
                println!("スイープ送信中...");
                for pitch in 0..=range {
                    sink.send(pitch)?;
                    println!("  pitch = {}", pitch);
                    std::thread::sleep(std::time::Duration::from_millis(300));
                }
                println!("スイープ完了");
            }
            "q" => {
                println!("終了します");
                break;
            }
            _ => {
                println!("不明なコマンド: {}", parts[0]);
            }
        }
    }

    Ok(())
}
