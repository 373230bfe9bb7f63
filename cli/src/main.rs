//! fwrelease
//!
//! Command-line front end: packs a firmware image into a double-encrypted
//! release file, and peels, unpacks or inspects existing release files.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use fwrelease_core::{
    cipher::{parse_key, AesEcb, BlockCipher, KeySize},
    constants::DEFAULT_CONFIG_FILE,
    release::{package_files, peel_platform_layer, read_release_header, unpack_release, ReleaseConfig, SystemClock},
    telemetry::Stage,
    types::{IoOp, ReleaseError},
    utils::{fmt_bytes, same_file},
};

#[derive(Parser)]
#[command(name = "fwrelease")]
#[command(about = "Double-layer AES firmware release packager")]
#[command(long_about = "
fwrelease - package firmware into a two-key encrypted release image

With no subcommand, `pack` runs with ./fwrelease.json.

EXAMPLES:
    # Package using the config in the current directory
    fwrelease

    # Package with an explicit config and output
    fwrelease pack -c board.json --destination out/release.bin

    # Platform side: remove the outer layer
    fwrelease peel release.bin peeled.bin --platform-key hex:...

    # Bench check: decrypt both layers and verify the CRC
    fwrelease unpack release.bin plain.bin --chip-key text:KEYFORCHIP --platform-key text:KEYFORPLATFORM

KEYS:
    hex:<digits>   raw key bytes
    text:<ascii>   zero-padded to the key length

ENVIRONMENT VARIABLES:
    FWRELEASE_CHIP_KEY       chip key for `unpack`
    FWRELEASE_PLATFORM_KEY   platform key for `peel` / `unpack`
    RUST_LOG                 Logging level (debug, info, warn, error)

EXIT STATUS:
    0 ok, 1 usage, 2 I/O, 3 clock, 4 key, 5 header, 6 config, 7 checksum,
    8 packager misuse
")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Encrypt a firmware image into a release file
    Pack {
        /// JSON config with paths, keys, version and developer tag
        #[arg(short, long, value_name = "CONFIG", default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,

        /// Override the source firmware path
        #[arg(long, value_name = "FILE")]
        source: Option<PathBuf>,

        /// Override the release output path
        #[arg(long, value_name = "FILE")]
        destination: Option<PathBuf>,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the header of a release file
    Inspect {
        #[arg(value_name = "RELEASE_FILE")]
        file: PathBuf,
    },

    /// Remove the platform layer, leaving a chip-key-only image
    Peel {
        #[arg(value_name = "RELEASE_FILE")]
        input: PathBuf,

        #[arg(value_name = "OUTPUT_FILE")]
        output: PathBuf,

        #[arg(long, env = "FWRELEASE_PLATFORM_KEY", hide_env_values = true)]
        platform_key: String,

        #[arg(long, value_enum, default_value = "aes128")]
        key_size: KeySizeArg,
    },

    /// Decrypt a release (or peeled) file and verify its CRC-32
    Unpack {
        #[arg(value_name = "RELEASE_FILE")]
        input: PathBuf,

        #[arg(value_name = "OUTPUT_FILE")]
        output: PathBuf,

        #[arg(long, env = "FWRELEASE_CHIP_KEY", hide_env_values = true)]
        chip_key: String,

        /// Omit when the input was already peeled
        #[arg(long, env = "FWRELEASE_PLATFORM_KEY", hide_env_values = true)]
        platform_key: Option<String>,

        #[arg(long, value_enum, default_value = "aes128")]
        key_size: KeySizeArg,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum KeySizeArg {
    Aes128,
    Aes192,
    Aes256,
}

impl From<KeySizeArg> for KeySize {
    fn from(arg: KeySizeArg) -> Self {
        match arg {
            KeySizeArg::Aes128 => KeySize::Aes128,
            KeySizeArg::Aes192 => KeySize::Aes192,
            KeySizeArg::Aes256 => KeySize::Aes256,
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // clap exits with 2 on bad usage, which is already the I/O class.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(1);
        }
    };
    let command = cli.command.unwrap_or(Commands::Pack {
        config: PathBuf::from(DEFAULT_CONFIG_FILE),
        source: None,
        destination: None,
        json: false,
    });

    match run(command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {:#}", err);
            let code = err
                .chain()
                .find_map(|e| e.downcast_ref::<ReleaseError>())
                .map(ReleaseError::exit_code)
                .unwrap_or(1);
            ExitCode::from(code)
        }
    }
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Pack { config, source, destination, json } => pack(&config, source, destination, json),
        Commands::Inspect { file } => inspect(&file),
        Commands::Peel { input, output, platform_key, key_size } => {
            let platform = cipher_from(&platform_key, key_size.into()).context("platform key")?;
            let (reader, writer) = open_pair(&input, &output)?;
            let header = peel_platform_layer(reader, writer, &platform).context("peeling platform layer")?;
            println!("peeled {} blocks into {}", header.block_count(), output.display());
            Ok(())
        }
        Commands::Unpack { input, output, chip_key, platform_key, key_size } => {
            let size: KeySize = key_size.into();
            let chip = cipher_from(&chip_key, size).context("chip key")?;
            let platform = platform_key
                .as_deref()
                .map(|k| cipher_from(k, size))
                .transpose()
                .context("platform key")?;

            let mut layers: Vec<&dyn BlockCipher> = Vec::with_capacity(2);
            if let Some(p) = platform.as_ref() {
                layers.push(p);
            }
            layers.push(&chip);

            let (reader, writer) = open_pair(&input, &output)?;
            let header = unpack_release(reader, writer, &layers).context("unpacking release")?;
            println!(
                "verified {} bytes, crc32 0x{:08x}, written to {}",
                header.firmware_length,
                header.firmware_checksum,
                output.display()
            );
            Ok(())
        }
    }
}

fn pack(config_path: &Path, source: Option<PathBuf>, destination: Option<PathBuf>, json: bool) -> Result<()> {
    let mut config = ReleaseConfig::from_json_file(config_path)
        .map_err(ReleaseError::from)
        .with_context(|| format!("loading config {}", config_path.display()))?;

    if let Some(s) = source {
        config.source = s;
    }
    if let Some(d) = destination {
        config.destination = d;
    }
    log::debug!("using {:?}", config);

    let summary = package_files(config, &SystemClock).context("packaging firmware")?;

    let t = &summary.telemetry;
    log::debug!("[PACK] {} bytes in, {} bytes out, {:?} elapsed", t.bytes_input, t.bytes_output, t.elapsed);
    for stage in Stage::ALL {
        if let Some(d) = t.stage_times.get(stage) {
            log::debug!("[PACK]   {:<8} {:?}", stage.to_string(), d);
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{}", summary);
    }
    Ok(())
}

fn inspect(path: &Path) -> Result<()> {
    let mut reader = BufReader::new(File::open(path).map_err(|e| ReleaseError::io(IoOp::OpenSource, e))?);
    let header = read_release_header(&mut reader).with_context(|| format!("reading {}", path.display()))?;

    println!("release file: {}", path.display());
    println!("    magic: {}", fmt_bytes(&header.magic));
    println!("    released: {}", header.timestamp());
    println!("    version: {}", header.version());
    println!("    developer: {}", header.developer());
    println!("    firmware length: {} bytes ({} blocks)", header.firmware_length, header.block_count());
    println!("    firmware CRC32: 0x{:08x}", header.firmware_checksum);
    Ok(())
}

fn cipher_from(key_text: &str, size: KeySize) -> Result<AesEcb> {
    let key = parse_key(key_text, size).map_err(ReleaseError::from)?;
    Ok(AesEcb::initialize(size, &key).map_err(ReleaseError::from)?)
}

fn open_pair(input: &Path, output: &Path) -> Result<(BufReader<File>, BufWriter<File>)> {
    if same_file(input, output) {
        bail!("input and output are the same file: {}", input.display());
    }
    let reader = File::open(input)
        .map_err(|e| ReleaseError::io(IoOp::OpenSource, e))
        .with_context(|| format!("opening {}", input.display()))?;
    let writer = File::create(output)
        .map_err(|e| ReleaseError::io(IoOp::OpenDestination, e))
        .with_context(|| format!("creating {}", output.display()))?;
    Ok((BufReader::new(reader), BufWriter::new(writer)))
}
