use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use stinger_chroma::config::AppConfig;
use stinger_chroma::constants::LOG_POLL_INTERVAL_MS;
use stinger_chroma::ffmpeg::commands::{ChromaCommandBuilder, ConversionCommand};
use stinger_chroma::ffmpeg::hwaccel::{self, HardwareAccel};
use stinger_chroma::ffmpeg::{locate, utils};
use stinger_chroma::i18n::{LanguageCatalog, Localize};
use stinger_chroma::params::{ChromaParams, RawParams};
use stinger_chroma::{AppError, ConversionController, ConversionOutcome, ConversionState};

/// Remove a solid background from a stinger transition and export a transparent WebM.
#[derive(Parser, Debug)]
#[command(name = "stinger-chroma", version, about)]
struct Args {
    /// Source video
    input: Option<PathBuf>,

    /// Key color as #RRGGBB
    #[arg(short, long)]
    color: Option<String>,

    /// Destination (.webm is enforced). Defaults to <input>_transparent.webm
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Chroma-key similarity
    #[arg(long)]
    tolerance: Option<String>,

    #[arg(long)]
    blend: Option<String>,

    /// Denoise strength, 0 disables the filter
    #[arg(long)]
    denoise: Option<f64>,

    #[arg(long, overrides_with = "no_despill")]
    despill: bool,

    #[arg(long, overrides_with = "despill")]
    no_despill: bool,

    /// none, nvidia, intel or amd
    #[arg(long)]
    hwaccel: Option<HardwareAccel>,

    /// Output size as WxH
    #[arg(long)]
    resolution: Option<String>,

    #[arg(long)]
    crf: Option<u32>,

    #[arg(long)]
    speed: Option<u32>,

    /// Force an output frame rate instead of keeping the source's
    #[arg(long)]
    fps: Option<u32>,

    #[arg(long, overrides_with = "audio")]
    no_audio: bool,

    /// Keep the audio track even if the config disables it
    #[arg(long, overrides_with = "no_audio")]
    audio: bool,

    #[arg(long)]
    audio_bitrate: Option<String>,

    /// FFmpeg binary to use
    #[arg(long)]
    ffmpeg: Option<PathBuf>,

    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory of language files
    #[arg(long)]
    languages: Option<PathBuf>,

    #[arg(long)]
    language: Option<String>,

    /// List the hardware accelerators FFmpeg reports and exit
    #[arg(long)]
    list_hwaccels: bool,

    /// Print the FFmpeg command instead of running it
    #[arg(long)]
    print_command: bool,

    /// Explain what a setting does and exit
    #[arg(long, value_enum)]
    explain: Option<Control>,
}

/// Settings that carry a localized explanation.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Control {
    Tolerance,
    Denoise,
    Despill,
    Hwaccel,
    Crf,
    Speed,
    Fps,
}

impl Control {
    fn help_key(self) -> &'static str {
        match self {
            Control::Tolerance => "tolerance",
            Control::Denoise => "denoise",
            Control::Despill => "despill",
            Control::Hwaccel => "hw_accel",
            Control::Crf => "crf",
            Control::Speed => "speed",
            Control::Fps => "fps",
        }
    }

    /// Title and message from the `help` section.
    fn explanation(self, strings: &dyn Localize) -> Option<(String, String)> {
        let key = self.help_key();
        let title = strings.lookup("help", Some(&format!("{}_title", key)))?;
        let message = strings.lookup("help", Some(&format!("{}_msg", key)))?;
        Some((title, message))
    }
}

/// Used when no language files could be loaded.
struct NoStrings;

impl Localize for NoStrings {
    fn lookup(&self, _section: &str, _field: Option<&str>) -> Option<String> {
        None
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => AppConfig::load_from_path(path),
        None => AppConfig::load(),
    };
    let strings = load_strings(&args, &config);

    match run(args, &config, strings.as_ref()) {
        Ok(code) => code,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_strings(args: &Args, config: &AppConfig) -> Box<dyn Localize> {
    let dir = args
        .languages
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.languages_dir));

    match LanguageCatalog::scan(&dir) {
        Ok(mut catalog) => {
            if let Some(language) = args.language.as_ref().or(config.language.as_ref()) {
                catalog.load_language(language);
            }
            Box::new(catalog)
        }
        Err(e) => {
            log::warn!("{}", e);
            Box::new(NoStrings)
        }
    }
}

fn run(args: Args, config: &AppConfig, strings: &dyn Localize) -> Result<ExitCode, AppError> {
    if let Some(control) = args.explain {
        return match control.explanation(strings) {
            Some((title, message)) => {
                println!("{}\n{}", title, message);
                Ok(ExitCode::SUCCESS)
            }
            None => Err(AppError::Localization(format!(
                "no help text for {}",
                control.help_key()
            ))),
        };
    }

    let override_path = args.ffmpeg.clone().or_else(|| config.ffmpeg_override());
    let ffmpeg = match locate::find_ffmpeg(override_path.as_deref()) {
        Ok(path) => path,
        Err(e) => {
            show_ffmpeg_help(strings);
            return Err(e);
        }
    };

    if args.list_hwaccels {
        for accel in hwaccel::detect_available(&ffmpeg) {
            println!("{}", accel);
        }
        return Ok(ExitCode::SUCCESS);
    }

    let raw = raw_params(&args, config);
    let params = ChromaParams::from_raw(&raw)?;
    let output_path = match &args.output {
        Some(path) => utils::with_output_extension(path),
        None => utils::default_output_path(&params.source_path),
    };
    let command = ChromaCommandBuilder::new(&params, &output_path).build(&ffmpeg);

    if args.print_command {
        println!("{}", command);
        return Ok(ExitCode::SUCCESS);
    }

    println!(
        "{}",
        strings.get_or("status", Some("converting"), "Converting, please wait...")
    );
    convert(&command, &output_path, strings)
}

fn raw_params(args: &Args, config: &AppConfig) -> RawParams {
    let mut raw = config.defaults.to_raw_params();

    raw.source_path = args
        .input
        .as_ref()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_default();
    raw.chroma_key_color = args.color.clone().unwrap_or_default();
    if let Some(tolerance) = &args.tolerance {
        raw.tolerance = tolerance.clone();
    }
    if let Some(blend) = &args.blend {
        raw.blend = blend.clone();
    }
    if let Some(denoise) = args.denoise {
        raw.denoise = denoise;
    }
    if let Some(despill) = switch(args.despill, args.no_despill) {
        raw.despill = despill;
    }
    if let Some(accel) = args.hwaccel {
        raw.hardware_accel = accel;
    }
    if let Some(resolution) = &args.resolution {
        raw.resolution = resolution.clone();
    }
    if let Some(crf) = args.crf {
        raw.crf = crf;
    }
    if let Some(speed) = args.speed {
        raw.speed = speed;
    }
    if let Some(fps) = args.fps {
        raw.keep_source_fps = false;
        raw.target_fps = fps;
    }
    if let Some(keep_audio) = switch(args.audio, args.no_audio) {
        raw.audio_disabled = !keep_audio;
    }
    if let Some(bitrate) = &args.audio_bitrate {
        raw.audio_bitrate = bitrate.clone();
    }
    raw
}

/// A `--x`/`--no-x` pair; `None` leaves the configured value alone.
fn switch(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

fn convert(
    command: &ConversionCommand,
    output_path: &Path,
    strings: &dyn Localize,
) -> Result<ExitCode, AppError> {
    let abort_flag = Arc::new(AtomicBool::new(false));
    let abort_flag_handler = abort_flag.clone();
    if let Err(e) = ctrlc::set_handler(move || abort_flag_handler.store(true, Ordering::SeqCst)) {
        log::warn!("Failed to set Ctrl+C handler: {}", e);
    }

    let mut controller = ConversionController::new();
    controller.start(command, output_path)?;

    loop {
        if abort_flag.swap(false, Ordering::SeqCst) && controller.cancel() {
            println!("{}", strings.get_or("status", Some("cancelled"), "Conversion cancelled."));
        }

        let update = controller.poll();
        for line in update.lines {
            println!("{}", line);
        }
        match update.outcome {
            Some(ConversionOutcome::Succeeded(path)) => {
                if let Some(progress) = controller.progress() {
                    println!("{}", progress.summary());
                }
                println!(
                    "{} {}",
                    strings.get_or("status", Some("success"), "Success! Saved to"),
                    path.display()
                );
            }
            Some(ConversionOutcome::Failed(error)) => {
                eprintln!(
                    "{} {}",
                    strings.get_or("status", Some("failed"), "Conversion failed. See log above."),
                    error
                );
            }
            None => {}
        }

        if !controller.is_busy() {
            break;
        }
        thread::sleep(Duration::from_millis(LOG_POLL_INTERVAL_MS));
    }

    Ok(match controller.state() {
        ConversionState::Succeeded { .. } => ExitCode::SUCCESS,
        ConversionState::Cancelled => ExitCode::from(130),
        _ => ExitCode::FAILURE,
    })
}

fn show_ffmpeg_help(strings: &dyn Localize) {
    let title = strings.get_string("help", Some("ffmpeg_not_found_title"));
    let message = strings.get_or(
        "help",
        Some("ffmpeg_not_found_msg"),
        "FFmpeg was not found. Place it next to this program or add it to your PATH.",
    );
    if !title.is_empty() {
        eprintln!("{}", title);
    }
    eprintln!("{}", message);
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Strings(Vec<(&'static str, &'static str)>);

    impl Localize for Strings {
        fn lookup(&self, section: &str, field: Option<&str>) -> Option<String> {
            if section != "help" {
                return None;
            }
            let field = field?;
            self.0
                .iter()
                .find(|(key, _)| *key == field)
                .map(|(_, value)| value.to_string())
        }
    }

    fn config_with(despill: bool, audio_disabled: bool) -> AppConfig {
        let mut config = AppConfig::default();
        config.defaults.despill = despill;
        config.defaults.audio_disabled = audio_disabled;
        config
    }

    #[test]
    fn test_flags_override_config_both_ways() {
        let config = config_with(true, true);

        let args = Args::parse_from(["stinger-chroma", "in.mp4", "--no-despill", "--audio"]);
        let raw = raw_params(&args, &config);
        assert!(!raw.despill);
        assert!(!raw.audio_disabled);

        let args = Args::parse_from(["stinger-chroma", "in.mp4"]);
        let raw = raw_params(&args, &config);
        assert!(raw.despill);
        assert!(raw.audio_disabled);

        let config = config_with(false, false);
        let args = Args::parse_from(["stinger-chroma", "in.mp4", "--despill", "--no-audio"]);
        let raw = raw_params(&args, &config);
        assert!(raw.despill);
        assert!(raw.audio_disabled);
    }

    #[test]
    fn test_last_of_paired_flags_wins() {
        let config = config_with(false, false);
        let args = Args::parse_from(["stinger-chroma", "in.mp4", "--despill", "--no-despill"]);
        assert!(!raw_params(&args, &config).despill);
    }

    #[test]
    fn test_explanation_reads_help_section() {
        let strings = Strings(vec![("hw_accel_title", "Hardware"), ("hw_accel_msg", "GPU decode")]);
        assert_eq!(
            Control::Hwaccel.explanation(&strings),
            Some(("Hardware".to_string(), "GPU decode".to_string()))
        );
        assert_eq!(Control::Crf.explanation(&strings), None);
        assert_eq!(Control::Crf.explanation(&NoStrings), None);
    }

    #[test]
    fn test_bundled_language_explains_every_control() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("languages");
        let catalog = LanguageCatalog::scan(&dir).unwrap();
        for control in Control::value_variants() {
            assert!(control.explanation(&catalog).is_some(), "{:?}", control);
        }
    }
}
