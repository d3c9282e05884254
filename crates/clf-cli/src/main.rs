//! voiceclf
//!
//! CLI классификатора голосовых клипов: HTTP-сервер, разовая классификация
//! файла и проверка директории модели.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use clf_core::model_files::ModelFiles;
use clf_core::PreprocessConfig;
use clf_pipeline::{InferencePipeline, Outcome};
use clf_server::{AppState, ServerConfig};

#[derive(Parser)]
#[command(name = "voiceclf")]
#[command(author, version, about = "Voice clip classifier: orig / tts / tts_gsm", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the model and serve POST /predict
    Serve {
        /// Path to the model directory
        #[arg(long)]
        model: PathBuf,

        /// Device to use (cpu, metal, cuda)
        #[arg(long, default_value = "cpu")]
        device: String,

        /// Bind address
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        /// Bind port
        #[arg(long, default_value_t = 5000)]
        port: u16,

        /// Maximum upload size, MiB
        #[arg(long, default_value_t = 32)]
        max_upload_mb: usize,

        /// JSON с параметрами предобработки (обрезка, гейт, громкость)
        #[arg(long)]
        preprocess_config: Option<PathBuf>,
    },

    /// Classify a local audio file and print the JSON response body
    Classify {
        /// Path to the model directory
        #[arg(long)]
        model: PathBuf,

        /// Path to the audio file (any format Symphonia can decode)
        #[arg(long)]
        audio: PathBuf,

        /// Device to use (cpu, metal, cuda)
        #[arg(long, default_value = "cpu")]
        device: String,

        /// JSON с параметрами предобработки
        #[arg(long)]
        preprocess_config: Option<PathBuf>,
    },

    /// Проверить файлы в директории модели
    Check {
        /// Path to the model directory
        #[arg(long)]
        model: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            model,
            device,
            host,
            port,
            max_upload_mb,
            preprocess_config,
        } => {
            let config = ServerConfig {
                host,
                port,
                max_upload_bytes: max_upload_mb * 1024 * 1024,
            };
            run_serve(&model, &device, preprocess_config.as_deref(), config).await
        }
        Commands::Classify {
            model,
            audio,
            device,
            preprocess_config,
        } => run_classify(&model, &audio, &device, preprocess_config.as_deref()),
        Commands::Check { model } => run_check(&model),
    }
}

fn load_preprocess_config(path: Option<&Path>) -> Result<PreprocessConfig> {
    match path {
        Some(p) => PreprocessConfig::from_file(p)
            .with_context(|| format!("Не удалось прочитать {}", p.display())),
        None => Ok(PreprocessConfig::default()),
    }
}

fn load_pipeline(
    model_dir: &Path,
    device: &str,
    preprocess_config: Option<&Path>,
) -> Result<InferencePipeline> {
    let config = load_preprocess_config(preprocess_config)?;
    let device = create_device(device)?;

    let start = Instant::now();
    let pipeline = InferencePipeline::from_model_dir(model_dir, &device, config)
        .with_context(|| format!("Не удалось загрузить модель из {}", model_dir.display()))?;
    info!(
        "Модель '{}' готова за {:.2}с",
        pipeline.model_name(),
        start.elapsed().as_secs_f64()
    );
    Ok(pipeline)
}

async fn run_serve(
    model_dir: &Path,
    device: &str,
    preprocess_config: Option<&Path>,
    config: ServerConfig,
) -> Result<()> {
    let pipeline = load_pipeline(model_dir, device, preprocess_config)?;
    let addr = config
        .addr()
        .with_context(|| format!("Некорректный адрес {}:{}", config.host, config.port))?;

    let app = clf_server::init(AppState::new(pipeline), &config);
    clf_server::serve(app, addr)
        .await
        .with_context(|| format!("HTTP-сервер завершился с ошибкой на {}", addr))?;
    Ok(())
}

fn run_classify(
    model_dir: &Path,
    audio: &Path,
    device: &str,
    preprocess_config: Option<&Path>,
) -> Result<()> {
    let pipeline = load_pipeline(model_dir, device, preprocess_config)?;
    let data = std::fs::read(audio)
        .with_context(|| format!("Не удалось прочитать {}", audio.display()))?;

    let start = Instant::now();
    let outcome = pipeline.run(&data);
    let elapsed = start.elapsed();

    if let Outcome::Rejected(reason) = &outcome {
        eprintln!("Клип отклонён: {}", reason);
    }
    let result = outcome.into_result()?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    eprintln!("Время: {:.2}s", elapsed.as_secs_f64());
    Ok(())
}

fn fmt_mib(bytes: u64) -> String {
    format!("{:.1} MiB", (bytes as f64) / (1024.0 * 1024.0))
}

fn run_check(model_dir: &Path) -> Result<()> {
    if !model_dir.is_dir() {
        anyhow::bail!("Директория модели не найдена: {}", model_dir.display());
    }

    let files = ModelFiles::inspect(model_dir);

    println!("Модель: {}", model_dir.display());
    println!("Файлы:");
    println!(
        "- config.json: {}",
        if files.config.is_some() { "OK" } else { "MISSING" }
    );
    println!(
        "- preprocessor_config.json: {}",
        if files.preprocessor_config.is_some() {
            "OK"
        } else {
            "MISSING (будут использованы параметры по умолчанию)"
        }
    );

    if files.weights.is_empty() {
        println!("- safetensors: MISSING");
        if let Some(e) = &files.weights_error {
            println!("  причина: {e}");
        }
    } else {
        println!(
            "- safetensors: OK ({} file(s), total {})",
            files.weights.len(),
            fmt_mib(files.weights_size_bytes())
        );
    }

    println!();
    println!(
        "Итог: serve={}",
        if files.is_ready() { "OK" } else { "NO" }
    );

    if !files.is_ready() {
        anyhow::bail!("Модель не готова (см. вывод выше).");
    }
    Ok(())
}

fn create_device(device: &str) -> Result<candle_core::Device> {
    match device {
        "metal" => {
            // candle может panic при инициализации Metal, если устройство недоступно.
            let prev_hook = std::panic::take_hook();
            std::panic::set_hook(Box::new(|_| {}));
            let res = std::panic::catch_unwind(|| candle_core::Device::new_metal(0));
            std::panic::set_hook(prev_hook);

            match res {
                Ok(Ok(dev)) => Ok(dev),
                Ok(Err(e)) => Err(e.into()),
                Err(_) => Err(anyhow::anyhow!(
                    "Инициализация Metal недоступна в этом окружении. Попробуйте --device cpu."
                )),
            }
        }
        "cuda" => Ok(candle_core::Device::new_cuda(0)?),
        "cpu" => Ok(candle_core::Device::Cpu),
        other => anyhow::bail!("Неизвестное устройство: {} (cpu, metal, cuda)", other),
    }
}
