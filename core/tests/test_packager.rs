// End-to-end packaging suite.
//
// Every run here goes through the real pipeline (clock → pad → CRC → chip
// layer → platform layer → header rewrite) against in-memory or temp files,
// then decrypts the payload by hand to check what landed on disk.

#[cfg(test)]
mod tests {
    use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};

    use fwrelease_core::{
        checksum::crc32,
        cipher::{key_from_text, AesEcb, Block, BlockCipher, KeySize},
        constants::{exit_codes, BLOCK_LEN, HEADER_LEN, MAGIC_RELEASE, PAD_BYTE},
        headers::{decode_header_le, FirmwareVersion, ReleaseHeader, ReleaseTimestamp},
        release::{package_files, Clock, ClockError, FixedClock, PackState, Packager, ReleaseConfig},
        telemetry::Stage,
        types::{IoOp, ReleaseError},
    };
    use proptest::prelude::*;

    const TS: ReleaseTimestamp = ReleaseTimestamp { year: 2024, month: 6, day: 14, hour: 9, minute: 30 };

    fn config(size: KeySize) -> ReleaseConfig {
        ReleaseConfig::new(
            key_from_text(b"KEYFORCHIP", size).unwrap(),
            key_from_text(b"KEYFORPLATFORM", size).unwrap(),
        )
    }

    fn pack(input: &[u8]) -> (Vec<u8>, Packager) {
        let mut packager = Packager::new(config(KeySize::Aes128)).unwrap();
        let mut out = Cursor::new(Vec::new());
        packager.run(&FixedClock(TS), Cursor::new(input.to_vec()), &mut out).unwrap();
        (out.into_inner(), packager)
    }

    /// Remove both layers (platform first) from the payload after the header.
    fn decrypt_payload(image: &[u8], cfg: &ReleaseConfig) -> Vec<u8> {
        let chip = AesEcb::initialize(cfg.key_size, &cfg.chip_key).unwrap();
        let platform = AesEcb::initialize(cfg.key_size, &cfg.platform_key).unwrap();

        let mut plain = Vec::with_capacity(image.len() - HEADER_LEN);
        for chunk in image[HEADER_LEN..].chunks(BLOCK_LEN) {
            let mut block: Block = chunk.try_into().unwrap();
            platform.decrypt_block_in_place(&mut block);
            chip.decrypt_block_in_place(&mut block);
            plain.extend_from_slice(&block);
        }
        plain
    }

    fn padded(input: &[u8]) -> Vec<u8> {
        let mut v = input.to_vec();
        while v.len() % BLOCK_LEN != 0 {
            v.push(PAD_BYTE);
        }
        v
    }

    fn header_of(image: &[u8]) -> ReleaseHeader {
        decode_header_le(image).unwrap()
    }

    struct BrokenClock;

    impl Clock for BrokenClock {
        fn now(&self) -> Result<ReleaseTimestamp, ClockError> {
            Err(ClockError::Unavailable("rtc not set".into()))
        }
    }

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "disk gone"))
        }
    }

    /// Seeks fine, refuses every write.
    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "disk full"))
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Seek for FailingWriter {
        fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
            match pos {
                SeekFrom::Start(n) => Ok(n),
                _ => Ok(0),
            }
        }
    }

    /// Hands out `good` bytes, then fails the next read.
    struct FailsMidBlock {
        good: usize,
    }

    impl Read for FailsMidBlock {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.good == 0 {
                return Err(io::Error::new(io::ErrorKind::Other, "EIO"));
            }
            let n = self.good.min(buf.len());
            buf[..n].fill(0x42);
            self.good -= n;
            Ok(n)
        }
    }

    #[derive(Clone, Copy, PartialEq)]
    enum Fault {
        ReserveSeek,
        HeaderSeek,
        HeaderWrite,
        Flush,
    }

    /// In-memory destination that fails exactly one step of the run.
    struct FaultyDestination {
        inner: Cursor<Vec<u8>>,
        fault: Fault,
        at_header: bool,
    }

    impl FaultyDestination {
        fn new(fault: Fault) -> Self {
            Self { inner: Cursor::new(Vec::new()), fault, at_header: false }
        }

        fn refuse(&self, when: Fault) -> io::Result<()> {
            if self.fault == when {
                return Err(io::Error::new(io::ErrorKind::Other, "device error"));
            }
            Ok(())
        }
    }

    impl Write for FaultyDestination {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.at_header {
                self.refuse(Fault::HeaderWrite)?;
            }
            self.inner.write(buf)
        }
        fn flush(&mut self) -> io::Result<()> {
            self.refuse(Fault::Flush)?;
            self.inner.flush()
        }
    }

    impl Seek for FaultyDestination {
        fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
            match pos {
                SeekFrom::Start(0) => {
                    self.refuse(Fault::HeaderSeek)?;
                    self.at_header = true;
                }
                SeekFrom::Start(_) => self.refuse(Fault::ReserveSeek)?,
                _ => {}
            }
            self.inner.seek(pos)
        }
    }

    fn run_with_fault(fault: Fault) -> (ReleaseError, Packager, Vec<u8>) {
        let mut packager = Packager::new(config(KeySize::Aes128)).unwrap();
        let mut dest = FaultyDestination::new(fault);
        let err = packager.run(&FixedClock(TS), &b"seventeen bytes!!"[..], &mut dest).unwrap_err();
        (err, packager, dest.inner.into_inner())
    }

// ## 1️⃣ Output shape

    #[test]
    fn output_is_header_plus_whole_blocks() {
        let input: Vec<u8> = (0..100u8).collect();
        let (image, _) = pack(&input);

        assert_eq!(&image[..4], &MAGIC_RELEASE);
        assert_eq!(image.len(), HEADER_LEN + 112);
        assert_eq!((image.len() - HEADER_LEN) % BLOCK_LEN, 0);

        let h = header_of(&image);
        assert_eq!(h.firmware_length, 112);
        assert_eq!(h.timestamp(), TS);
        assert_eq!(h.version(), FirmwareVersion::default());
        assert_eq!(h.developer(), "HCL");
    }

    #[test]
    fn header_checksum_covers_padded_plaintext() {
        let input = b"firmware image that is not block aligned";
        let (image, _) = pack(input);

        let h = header_of(&image);
        assert_eq!(h.firmware_checksum, crc32(&padded(input)));
        assert_ne!(h.firmware_checksum, crc32(&image[HEADER_LEN..]));
    }

    #[test]
    fn peeling_both_layers_restores_padded_input() {
        let input: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
        let (image, packager) = pack(&input);
        assert_eq!(decrypt_payload(&image, packager.config()), padded(&input));
    }

// ## 2️⃣ Block boundaries

    #[test]
    fn exact_block_gets_no_padding() {
        let input = [0x11u8; 16];
        let (image, packager) = pack(&input);

        assert_eq!(image.len(), HEADER_LEN + 16);
        assert_eq!(header_of(&image).firmware_length, 16);
        assert_eq!(decrypt_payload(&image, packager.config()), input.to_vec());
    }

    #[test]
    fn seventeen_bytes_pad_second_block_with_ff() {
        let input: Vec<u8> = (1..=17u8).collect();
        let (image, packager) = pack(&input);

        assert_eq!(header_of(&image).firmware_length, 32);
        let plain = decrypt_payload(&image, packager.config());
        assert_eq!(&plain[..17], &input[..]);
        assert_eq!(plain[16], 17);
        assert!(plain[17..].iter().all(|&b| b == 0xFF));
        assert_eq!(plain.len() - 17, 15);
    }

    #[test]
    fn empty_input_writes_header_only() {
        let (image, packager) = pack(&[]);

        assert_eq!(image.len(), HEADER_LEN);
        let h = header_of(&image);
        assert_eq!(h.firmware_length, 0);
        assert_eq!(h.firmware_checksum, 0);
        assert_eq!(packager.state(), PackState::Done);
    }

    #[test]
    fn identical_plaintext_blocks_encrypt_identically() {
        // ECB: no chaining between blocks.
        let input = [0xA5u8; 48];
        let (image, _) = pack(&input);
        let payload = &image[HEADER_LEN..];
        assert_eq!(payload[0..16], payload[16..32]);
        assert_eq!(payload[16..32], payload[32..48]);
        assert_ne!(&payload[0..16], &input[0..16]);
    }

    #[test]
    fn larger_keys_produce_same_plaintext() {
        let input = b"aes-256 build of the same image";
        let cfg = config(KeySize::Aes256);
        let mut packager = Packager::new(cfg.clone()).unwrap();
        let mut out = Cursor::new(Vec::new());
        let summary = packager.run(&FixedClock(TS), &input[..], &mut out).unwrap();

        assert_eq!(summary.key_size, KeySize::Aes256);
        assert_eq!(decrypt_payload(out.get_ref(), &cfg), padded(input));
    }

// ## 3️⃣ State machine and failures

    #[test]
    fn state_moves_from_init_to_done() {
        let mut packager = Packager::new(config(KeySize::Aes128)).unwrap();
        assert_eq!(packager.state(), PackState::Init);

        let mut out = Cursor::new(Vec::new());
        packager.run(&FixedClock(TS), &b"abc"[..], &mut out).unwrap();
        assert_eq!(packager.state(), PackState::Done);
    }

    #[test]
    fn packager_cannot_be_reused() {
        let (_, mut packager) = pack(b"once");
        let mut out = Cursor::new(Vec::new());
        let err = packager.run(&FixedClock(TS), &b"twice"[..], &mut out).unwrap_err();

        assert!(matches!(err, ReleaseError::InvalidState { state: PackState::Done }));
        assert_eq!(err.exit_code(), exit_codes::INTERNAL);
        assert_ne!(err.exit_code(), exit_codes::CONFIG);
        assert!(out.get_ref().is_empty());
    }

    #[test]
    fn process_requires_clock_first() {
        let mut packager = Packager::new(config(KeySize::Aes128)).unwrap();
        let mut out = Cursor::new(Vec::new());
        let err = packager.process(&b"abc"[..], &mut out).unwrap_err();
        assert!(matches!(err, ReleaseError::InvalidState { state: PackState::Init }));
        assert_eq!(err.exit_code(), exit_codes::INTERNAL);
    }

    #[test]
    fn clock_failure_aborts_before_any_output() {
        let mut packager = Packager::new(config(KeySize::Aes128)).unwrap();
        let mut out = Cursor::new(Vec::new());
        let err = packager.run(&BrokenClock, &b"abc"[..], &mut out).unwrap_err();

        assert!(matches!(err, ReleaseError::Clock(ClockError::Unavailable(_))));
        assert_eq!(err.exit_code(), exit_codes::CLOCK);
        assert_eq!(packager.state(), PackState::Failed);
        assert!(out.get_ref().is_empty());
    }

    #[test]
    fn read_failure_is_reported_as_read() {
        let mut packager = Packager::new(config(KeySize::Aes128)).unwrap();
        let mut out = Cursor::new(Vec::new());
        let err = packager.run(&FixedClock(TS), FailingReader, &mut out).unwrap_err();

        assert!(matches!(err, ReleaseError::Io { op: IoOp::Read, .. }));
        assert_eq!(err.exit_code(), exit_codes::IO);
        assert_eq!(packager.state(), PackState::Failed);
    }

    #[test]
    fn write_failure_is_reported_as_write() {
        let mut packager = Packager::new(config(KeySize::Aes128)).unwrap();
        let err = packager.run(&FixedClock(TS), &b"payload"[..], FailingWriter).unwrap_err();

        assert!(matches!(err, ReleaseError::Io { op: IoOp::Write, .. }));
        assert!(err.to_string().contains("disk full"));
        assert_eq!(packager.state(), PackState::Failed);
    }

    #[test]
    fn read_failure_inside_a_block_writes_nothing() {
        let mut packager = Packager::new(config(KeySize::Aes128)).unwrap();
        let mut out = Cursor::new(Vec::new());
        let err = packager.run(&FixedClock(TS), FailsMidBlock { good: 5 }, &mut out).unwrap_err();

        assert!(matches!(err, ReleaseError::Io { op: IoOp::Read, .. }));
        assert_eq!(packager.state(), PackState::Failed);
        assert!(out.get_ref().is_empty());
    }

    #[test]
    fn read_failure_after_full_blocks_keeps_earlier_blocks() {
        let mut packager = Packager::new(config(KeySize::Aes128)).unwrap();
        let mut out = Cursor::new(Vec::new());
        let err = packager.run(&FixedClock(TS), FailsMidBlock { good: 37 }, &mut out).unwrap_err();

        assert!(matches!(err, ReleaseError::Io { op: IoOp::Read, .. }));
        // two whole blocks went out, header region still unwritten
        assert_eq!(out.get_ref().len(), HEADER_LEN + 32);
        assert!(out.get_ref()[..HEADER_LEN].iter().all(|&b| b == 0));
    }

    #[test]
    fn reserve_failure_is_reported_before_streaming() {
        let (err, packager, written) = run_with_fault(Fault::ReserveSeek);

        assert!(matches!(err, ReleaseError::Io { op: IoOp::ReserveHeader, .. }));
        assert_eq!(err.exit_code(), exit_codes::IO);
        assert_eq!(packager.state(), PackState::Failed);
        assert!(written.is_empty());
    }

    #[test]
    fn header_seek_failure_is_reported() {
        let (err, packager, written) = run_with_fault(Fault::HeaderSeek);

        assert!(matches!(err, ReleaseError::Io { op: IoOp::SeekHeader, .. }));
        assert_eq!(packager.state(), PackState::Failed);
        // payload is on disk, header is not
        assert_eq!(written.len(), HEADER_LEN + 32);
        assert_ne!(&written[..4], &MAGIC_RELEASE);
    }

    #[test]
    fn header_write_failure_is_reported() {
        let (err, packager, _) = run_with_fault(Fault::HeaderWrite);

        assert!(matches!(err, ReleaseError::Io { op: IoOp::WriteHeader, .. }));
        assert_eq!(packager.state(), PackState::Failed);
    }

    #[test]
    fn close_failure_is_reported() {
        let (err, packager, written) = run_with_fault(Fault::Flush);

        assert!(matches!(err, ReleaseError::Io { op: IoOp::Close, .. }));
        assert!(err.to_string().contains("device error"));
        assert_eq!(err.exit_code(), exit_codes::IO);
        assert_eq!(packager.state(), PackState::Failed);
        // everything was written before the close step failed
        assert_eq!(&written[..4], &MAGIC_RELEASE);
    }

    #[test]
    fn mismatched_key_lengths_are_rejected_up_front() {
        let cfg = ReleaseConfig::new(
            key_from_text(b"KEYFORCHIP", KeySize::Aes128).unwrap(),
            key_from_text(b"KEYFORPLATFORM", KeySize::Aes192).unwrap(),
        );
        let err = Packager::new(cfg).err().unwrap();
        assert!(matches!(err, ReleaseError::Key(_)));
        assert_eq!(err.exit_code(), exit_codes::KEY);
    }

    #[test]
    fn oversized_developer_tag_is_a_config_error() {
        let cfg = config(KeySize::Aes128).with_developer("X".repeat(28));
        let err = Packager::new(cfg).err().unwrap();
        assert!(matches!(err, ReleaseError::Config(_)));
        assert_eq!(err.exit_code(), exit_codes::CONFIG);
    }

// ## 4️⃣ Summary and telemetry

    #[test]
    fn summary_reports_header_fields_and_counts() {
        let input = [7u8; 40];
        let mut packager = Packager::new(
            config(KeySize::Aes128)
                .with_version(FirmwareVersion { major: 3, minor: 1, revision: 4 })
                .with_developer("ACME"),
        )
        .unwrap();
        let mut out = Cursor::new(Vec::new());
        let summary = packager.run(&FixedClock(TS), &input[..], &mut out).unwrap();

        assert_eq!(summary.firmware_length, 48);
        assert_eq!(summary.firmware_checksum, crc32(&padded(&input)));
        assert_eq!(summary.version.to_string(), "3.1.4");
        assert_eq!(summary.developer, "ACME");
        assert_eq!(summary.timestamp, TS);

        let t = &summary.telemetry;
        assert_eq!(t.blocks, 3);
        assert_eq!(t.blocks_padded, 1);
        assert_eq!(t.bytes_input, 40);
        assert_eq!(t.bytes_padding, 8);
        assert_eq!(t.bytes_payload, 48);
        assert_eq!(t.bytes_output, (HEADER_LEN + 48) as u64);
        assert!(t.sanity_check());
        assert!(Stage::ALL.iter().all(|&s| t.stage_times.get(s).is_some()));
        let text = summary.to_string();
        assert!(text.contains("year: 2024; month: 6; day: 14; hour: 9; minute: 30"));
        assert!(text.contains("developer: ACME"));
        assert!(text.ends_with(&format!("firmware CRC32: 0x{:08x}", summary.firmware_checksum)));
    }

    #[test]
    fn summary_serializes_to_json() {
        let mut packager = Packager::new(config(KeySize::Aes128)).unwrap();
        let mut out = Cursor::new(Vec::new());
        let summary = packager.run(&FixedClock(TS), &b"json"[..], &mut out).unwrap();

        let v: serde_json::Value = serde_json::to_value(&summary).unwrap();
        assert_eq!(v["firmware_length"], 16);
        assert_eq!(v["key_size"], "aes128");
        assert_eq!(v["timestamp"]["year"], 2024);
        assert_eq!(v["telemetry"]["blocks"], 1);
    }

// ## 5️⃣ Files on disk

    #[test]
    fn package_files_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("app.bin");
        let dst = dir.path().join("app_release.bin");
        let input: Vec<u8> = (0..77u8).collect();
        std::fs::write(&src, &input).unwrap();

        let cfg = config(KeySize::Aes128).with_paths(&src, &dst);
        let summary = package_files(cfg.clone(), &FixedClock(TS)).unwrap();

        let image = std::fs::read(&dst).unwrap();
        assert_eq!(image.len(), HEADER_LEN + 80);
        assert_eq!(summary.file_name, dst.display().to_string());
        assert_eq!(header_of(&image).firmware_checksum, summary.firmware_checksum);
        assert_eq!(decrypt_payload(&image, &cfg), padded(&input));

        // source is left untouched
        assert_eq!(std::fs::read(&src).unwrap(), input);
    }

    #[test]
    fn missing_source_is_an_open_error() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(KeySize::Aes128).with_paths(dir.path().join("nope.bin"), dir.path().join("out.bin"));

        let err = package_files(cfg, &FixedClock(TS)).unwrap_err();
        assert!(matches!(err, ReleaseError::Io { op: IoOp::OpenSource, .. }));
        assert_eq!(err.exit_code(), exit_codes::IO);
    }

    #[test]
    fn same_source_and_destination_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fw.bin");
        std::fs::write(&path, b"keep me").unwrap();

        let err = package_files(config(KeySize::Aes128).with_paths(&path, &path), &FixedClock(TS)).unwrap_err();
        assert!(matches!(err, ReleaseError::Config(_)));
        assert_eq!(std::fs::read(&path).unwrap(), b"keep me");
    }

// ## 6️⃣ Properties

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_any_input_packs_and_unpacks(input in proptest::collection::vec(any::<u8>(), 0..700)) {
            let (image, packager) = pack(&input);
            let want = padded(&input);
            let h = header_of(&image);

            prop_assert_eq!(image.len(), HEADER_LEN + want.len());
            prop_assert_eq!(h.firmware_length as usize, want.len());
            prop_assert_eq!(h.firmware_checksum, crc32(&want));
            prop_assert_eq!(decrypt_payload(&image, packager.config()), want);
        }
    }
}
