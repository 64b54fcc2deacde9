mod common;

mod tests {
    use myrtio_light_painter::profiler::MAX_ROWS_PER_SECOND;
    use myrtio_light_painter::{
        BLOCK_SIZE, ColorPipeline, Duration, Error, FrameStore, MAX_FRAMES, PainterConfig,
        ThroughputProfiler,
    };

    use crate::common::{RamDisk, ScriptClock, bitmap};

    fn disk_with_frame(rows: i32) -> RamDisk {
        let mut disk = RamDisk::new();
        disk.add_file("A.BMP", bitmap(144, rows, |_, _| [1, 2, 3]));
        let pipeline = ColorPipeline::new(&PainterConfig::DEFAULT);
        let mut buffer = [0; BLOCK_SIZE];
        pipeline
            .process(&mut disk, "A.BMP", Some("A.RAW"), 255, &mut buffer)
            .unwrap();
        disk
    }

    #[test]
    fn test_rate_never_exceeds_ceiling() {
        let short = ThroughputProfiler::new(&PainterConfig {
            strip_length: 1,
            ..PainterConfig::DEFAULT
        });
        assert_eq!(
            short.rate_for_latency(Duration::from_ticks(0)),
            MAX_ROWS_PER_SECOND
        );
    }

    #[test]
    fn test_rate_includes_margin_and_transmission() {
        let profiler = ThroughputProfiler::new(&PainterConfig::DEFAULT);
        // 1.05 ms read + 144 * 30 us transmit + 50 us loop = 5.42 ms
        assert_eq!(profiler.rate_for_latency(Duration::from_micros(1_000)), 184);
        assert_eq!(profiler.rate_for_latency(Duration::from_ticks(0)), 228);
    }

    #[test]
    fn test_measure_keeps_worst_read() {
        let mut disk = disk_with_frame(4);
        let mut clock = ScriptClock::new(&[0, 100, 100, 400, 400, 450, 450, 500]);
        let profiler = ThroughputProfiler::new(&PainterConfig::DEFAULT);
        let mut buffer = [0; BLOCK_SIZE];
        let reads_before = disk.block_reads;

        let profile = profiler
            .measure_frame(&mut disk, &mut clock, "A.RAW", &mut buffer)
            .unwrap();

        assert_eq!(profile.worst_read, Duration::from_micros(300));
        assert_eq!(
            profile.max_rows_per_second,
            profiler.rate_for_latency(Duration::from_micros(300))
        );
        assert_eq!(disk.block_reads - reads_before, 4);
    }

    #[test]
    fn test_fragmented_frame_rejected() {
        let mut disk = disk_with_frame(2);
        disk.fragment("A.RAW");
        let profiler = ThroughputProfiler::new(&PainterConfig::DEFAULT);
        let mut buffer = [0; BLOCK_SIZE];

        let mut clock = ScriptClock::default();
        let result = profiler.measure_frame(&mut disk, &mut clock, "A.RAW", &mut buffer);
        assert_eq!(result, Err(Error::StorageFragmented));
    }

    #[test]
    fn test_profile_all() {
        let profiler = ThroughputProfiler::new(&PainterConfig::DEFAULT);
        let mut buffer = [0; BLOCK_SIZE];
        let mut store = FrameStore::<MAX_FRAMES>::new();

        let mut empty = RamDisk::new();
        store.quick_scan(&mut empty).unwrap();
        assert_eq!(
            profiler
                .profile_all(&store, &mut empty, &mut ScriptClock::default(), &mut buffer)
                .unwrap(),
            MAX_ROWS_PER_SECOND
        );

        let mut disk = disk_with_frame(3);
        store.quick_scan(&mut disk).unwrap();
        // Reads take 0, 200 and 0 us
        let mut clock = ScriptClock::new(&[0, 0, 0, 200, 200, 200]);
        let ceiling = profiler
            .profile_all(&store, &mut disk, &mut clock, &mut buffer)
            .unwrap();
        assert_eq!(ceiling, profiler.rate_for_latency(Duration::from_micros(200)));
    }
}
