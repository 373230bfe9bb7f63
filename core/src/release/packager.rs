// ## 📂 File: `src/release/packager.rs`

//! src/release/packager.rs
//! Read → pad → checksum → double-encrypt → write, then rewrite the header.
//!
//! Design notes:
//! - One `Packager` per run; it owns the header, both key schedules and the
//!   checksum accumulator. Nothing is global.
//! - The header region is reserved by seeking past it, the payload is streamed
//!   one block at a time, and the header is written last once totals are known.
//! - Layer order is fixed: chip key innermost, platform key outermost. The
//!   platform can peel its layer without ever seeing plaintext.
//! - Any failure moves the packager to `Failed`. A half-written destination is
//!   left as is.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};

use crate::checksum::Crc32Accumulator;
use crate::cipher::{AesEcb, Block, BlockCipher};
use crate::constants::{BLOCK_LEN, HEADER_LEN};
use crate::headers::{encode_header_le, ReleaseHeader};
use crate::release::clock::Clock;
use crate::release::config::ReleaseConfig;
use crate::release::summary::ReleaseSummary;
use crate::telemetry::{Stage, TelemetryCounters, TelemetrySnapshot, TelemetryTimer};
use crate::types::{IoOp, ReleaseError};
use crate::utils::{pad_block, read_exact_or_eof};

/// Largest payload the 32-bit length field can describe.
pub const MAX_FIRMWARE_LEN: u32 = u32::MAX - (u32::MAX % BLOCK_LEN as u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackState {
    Init,
    Opened,
    Streaming,
    Finalizing,
    Done,
    Failed,
}

impl fmt::Display for PackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PackState::Init       => "init",
            PackState::Opened     => "opened",
            PackState::Streaming  => "streaming",
            PackState::Finalizing => "finalizing",
            PackState::Done       => "done",
            PackState::Failed     => "failed",
        };
        f.write_str(name)
    }
}

/// Per-run secrets and running checksum. Built once before the first block.
struct LayerContexts {
    chip: AesEcb,
    platform: AesEcb,
    crc: Crc32Accumulator,
}

impl LayerContexts {
    fn initialize(config: &ReleaseConfig) -> Result<Self, ReleaseError> {
        Ok(Self {
            chip: AesEcb::initialize(config.key_size, &config.chip_key)?,
            platform: AesEcb::initialize(config.key_size, &config.platform_key)?,
            crc: Crc32Accumulator::prepare(),
        })
    }
}

pub struct Packager {
    config: ReleaseConfig,
    header: ReleaseHeader,
    state: PackState,
    clock_read: bool,
    counters: TelemetryCounters,
    timer: TelemetryTimer,
}

impl Packager {
    /// Validate the config and prepare a header with version and developer tag.
    pub fn new(config: ReleaseConfig) -> Result<Self, ReleaseError> {
        config.validate()?;
        let header = ReleaseHeader::new(config.version, config.developer.as_bytes())?;

        Ok(Self {
            config,
            header,
            state: PackState::Init,
            clock_read: false,
            counters: TelemetryCounters::default(),
            timer: TelemetryTimer::new(),
        })
    }

    pub fn state(&self) -> PackState {
        self.state
    }

    pub fn header(&self) -> &ReleaseHeader {
        &self.header
    }

    pub fn config(&self) -> &ReleaseConfig {
        &self.config
    }

    /// Capture the release time into the header.
    pub fn begin(&mut self, clock: &dyn Clock) -> Result<(), ReleaseError> {
        self.expect_state(PackState::Init)?;
        self.timer = TelemetryTimer::new();

        let ts = self.timer.time(Stage::Clock, || clock.now());
        let ts = self.fail_on_err(ts.map_err(ReleaseError::from))?;
        self.header.set_timestamp(ts);
        self.clock_read = true;

        log::debug!("[PACKAGER] release time {}", ts);
        Ok(())
    }

    /// `begin` followed by `process`.
    pub fn run<R: Read, W: Write + Seek>(
        &mut self,
        clock: &dyn Clock,
        reader: R,
        writer: W,
    ) -> Result<ReleaseSummary, ReleaseError> {
        self.begin(clock)?;
        self.process(reader, writer)
    }

    /// Package into an already opened destination. `begin` must have run.
    pub fn process<R: Read, W: Write + Seek>(&mut self, reader: R, writer: W) -> Result<ReleaseSummary, ReleaseError> {
        self.expect_state(PackState::Init)?;
        if !self.clock_read {
            return Err(ReleaseError::InvalidState { state: self.state });
        }

        let result = self.process_inner(reader, writer);
        self.fail_on_err(result)
    }

    /// Open `config.source` and `config.destination`, package, then sync the
    /// destination to disk. File handles are dropped on every exit path.
    pub fn package_files(&mut self, clock: &dyn Clock) -> Result<ReleaseSummary, ReleaseError> {
        self.begin(clock)?;

        let opened = self.open_files();
        let (source, destination) = self.fail_on_err(opened)?;
        let mut source = BufReader::new(source);
        let mut destination = BufWriter::new(destination);

        let summary = self.process(&mut source, &mut destination)?;

        let closed = close_destination(destination);
        self.fail_on_err(closed)?;
        drop(source);
        log::debug!("[PACKAGER] closed {} and {}", self.config.source.display(), self.config.destination.display());

        Ok(summary)
    }

    fn open_files(&self) -> Result<(File, File), ReleaseError> {
        let source = File::open(&self.config.source).map_err(|e| ReleaseError::io(IoOp::OpenSource, e))?;
        let destination = File::create(&self.config.destination).map_err(|e| ReleaseError::io(IoOp::OpenDestination, e))?;
        Ok((source, destination))
    }

    fn process_inner<R: Read, W: Write + Seek>(&mut self, mut reader: R, mut writer: W) -> Result<ReleaseSummary, ReleaseError> {
        // ---- Opened: reserve the header region, build key schedules ----
        writer
            .seek(SeekFrom::Start(HEADER_LEN as u64))
            .map_err(|e| ReleaseError::io(IoOp::ReserveHeader, e))?;
        let LayerContexts { chip, platform, mut crc } = LayerContexts::initialize(&self.config)?;
        self.state = PackState::Opened;
        log::debug!("[PACKAGER] header reserved ({} bytes), {} contexts ready", HEADER_LEN, self.config.key_size);

        // ---- Streaming ----
        self.state = PackState::Streaming;
        self.stream_blocks(&mut reader, &mut writer, &chip, &platform, &mut crc)?;

        // ---- Finalizing ----
        self.state = PackState::Finalizing;
        self.header.firmware_checksum = crc.finish();
        self.write_header(&mut writer)?;

        // ---- Done ----
        self.timer
            .time(Stage::Close, || writer.flush())
            .map_err(|e| ReleaseError::io(IoOp::Close, e))?;
        self.state = PackState::Done;
        self.timer.finish();

        let snapshot = TelemetrySnapshot::from(&self.counters, &self.timer);
        if !snapshot.sanity_check() {
            log::warn!("[PACKAGER] telemetry inconsistent: {:?}", snapshot);
        }
        log::info!(
            "[PACKAGER] {} blocks, {} bytes, crc32=0x{:08x}",
            snapshot.blocks,
            self.header.firmware_length,
            self.header.firmware_checksum
        );

        Ok(ReleaseSummary::new(
            self.config.destination.display().to_string(),
            &self.header,
            self.config.key_size,
            snapshot,
        ))
    }

    fn stream_blocks<R: Read, W: Write, C: BlockCipher>(
        &mut self,
        reader: &mut R,
        writer: &mut W,
        chip: &C,
        platform: &C,
        crc: &mut Crc32Accumulator,
    ) -> Result<(), ReleaseError> {
        let mut block: Block = [0u8; BLOCK_LEN];

        loop {
            let filled = self
                .timer
                .time(Stage::Read, || read_exact_or_eof(reader, &mut block))
                .map_err(|e| ReleaseError::io(IoOp::Read, e))?;

            if filled == 0 {
                break;
            }

            let pad = pad_block(&mut block, filled);

            self.header.firmware_length = self
                .header
                .firmware_length
                .checked_add(BLOCK_LEN as u32)
                .ok_or(ReleaseError::FirmwareTooLarge { max: MAX_FIRMWARE_LEN as u64 })?;

            // Checksum covers the padded plaintext, never the ciphertext.
            self.timer.time(Stage::Checksum, || crc.update(&block));

            self.timer.time(Stage::Encrypt, || {
                chip.encrypt_block_in_place(&mut block);
                platform.encrypt_block_in_place(&mut block);
            });

            self.timer
                .time(Stage::Write, || writer.write_all(&block))
                .map_err(|e| ReleaseError::io(IoOp::Write, e))?;

            self.counters.add_block(filled, pad);

            if pad > 0 {
                log::debug!("[PACKAGER] final block padded with {} bytes", pad);
                break;
            }
        }

        Ok(())
    }

    fn write_header<W: Write + Seek>(&mut self, writer: &mut W) -> Result<(), ReleaseError> {
        let buf = encode_header_le(&self.header);

        self.timer.time(Stage::Header, || -> Result<(), ReleaseError> {
            writer
                .seek(SeekFrom::Start(0))
                .map_err(|e| ReleaseError::io(IoOp::SeekHeader, e))?;
            writer
                .write_all(&buf)
                .map_err(|e| ReleaseError::io(IoOp::WriteHeader, e))
        })?;

        self.counters.add_header(buf.len());
        log::debug!("[PACKAGER] header written: length={} crc32=0x{:08x}", self.header.firmware_length, self.header.firmware_checksum);
        Ok(())
    }

    fn expect_state(&self, want: PackState) -> Result<(), ReleaseError> {
        if self.state != want {
            return Err(ReleaseError::InvalidState { state: self.state });
        }
        Ok(())
    }

    fn fail_on_err<T>(&mut self, result: Result<T, ReleaseError>) -> Result<T, ReleaseError> {
        if let Err(e) = &result {
            log::error!("[PACKAGER] failed in state {}: {}", self.state, e);
            self.state = PackState::Failed;
        }
        result
    }
}

/// Flush buffered payload and sync the file, surfacing close-time errors.
fn close_destination(destination: BufWriter<File>) -> Result<(), ReleaseError> {
    let file = destination
        .into_inner()
        .map_err(|e| ReleaseError::io(IoOp::Close, e.into_error()))?;
    file.sync_all().map_err(|e| ReleaseError::io(IoOp::Close, e))
}

/// Package `config.source` into `config.destination` in one call.
pub fn package_files(config: ReleaseConfig, clock: &dyn Clock) -> Result<ReleaseSummary, ReleaseError> {
    Packager::new(config)?.package_files(clock)
}
