//! Integration tests for writing, reading and exporting recordings on disk.

use lecrec_core::{
    AudioExporter, AudioFormat, AudioStream, ExportConfig, ProgressCallback, ReaderConfig,
    RecordingError, RecordingReader, RecordingResult, RecordingSections, RecordingWriter,
    ScreenCaptureParser, ScreenCaptureStream, SectionKind, SectionPayload, WriterConfig,
    HEADER_SIZE,
};
use std::io::Cursor;
use std::path::Path;
use tempfile::tempdir;

/// Events log stored as `millis:label` lines.
#[derive(Debug, PartialEq)]
struct EventLog(Vec<(u64, String)>);

impl SectionPayload for EventLog {
    fn to_bytes(&self) -> RecordingResult<Vec<u8>> {
        let text: String = self
            .0
            .iter()
            .map(|(at, label)| format!("{at}:{label}\n"))
            .collect();
        Ok(text.into_bytes())
    }

    fn parse_from(bytes: &[u8]) -> RecordingResult<Self> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| RecordingError::invalid_argument(e.to_string()))?;
        text.lines()
            .map(|line| {
                let (at, label) = line
                    .split_once(':')
                    .ok_or_else(|| RecordingError::invalid_argument("missing separator"))?;
                let at = at
                    .parse()
                    .map_err(|_| RecordingError::invalid_argument("bad timestamp"))?;
                Ok((at, label.to_string()))
            })
            .collect::<RecordingResult<_>>()
            .map(EventLog)
    }
}

fn wav(format: AudioFormat, frames: u32) -> Vec<u8> {
    let mut cursor = Cursor::new(Vec::new());
    let mut writer = hound::WavWriter::new(&mut cursor, format.to_wav_spec()).unwrap();
    for i in 0..frames * u32::from(format.channels) {
        writer.write_sample(i as i16).unwrap();
    }
    writer.finalize().unwrap();
    cursor.into_inner()
}

fn events() -> EventLog {
    EventLog(vec![
        (0, "start".to_string()),
        (1_250, "next-slide".to_string()),
        (4_000, "pen-down".to_string()),
    ])
}

fn write_sample(path: &Path, audio: &AudioStream, screen: &[u8]) -> u64 {
    let document = b"<deck slides=\"12\"/>".to_vec();
    let mut screen = screen.to_vec();
    RecordingWriter::default()
        .write(
            RecordingSections::new(&events(), &document, audio).with_screen_capture(&mut screen),
            path,
            None,
        )
        .unwrap()
}

#[test]
fn round_trip_on_disk() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("lecture.rec");
    let wav_bytes = wav(AudioFormat::pcm(16_000, 1, 16), 1_600);
    let audio = AudioStream::from_wav_bytes(wav_bytes.clone()).unwrap();

    let total = write_sample(&path, &audio, b"screen-frames");
    assert_eq!(total, std::fs::metadata(&path).unwrap().len());

    let handle = RecordingReader::default().read(&path).unwrap();
    let header = handle.header();
    assert_eq!(header.audio_length as usize, wav_bytes.len());
    assert_eq!(header.screen_capture_length, 13);
    assert_eq!(handle.parse_events::<EventLog>().unwrap(), events());
    assert_eq!(handle.duration_millis(), 100);

    let mut raw = handle.audio_window().try_clone().unwrap();
    assert_eq!(raw.read_to_end_vec().unwrap(), wav_bytes);
}

#[test]
fn minimal_file_is_header_only() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("empty.rec");
    let empty = Vec::<u8>::new();

    let total = RecordingWriter::default()
        .write(
            RecordingSections::new(&empty, &empty, &AudioStream::empty()),
            &path,
            None,
        )
        .unwrap();
    assert_eq!(total, HEADER_SIZE as u64);

    let handle = RecordingReader::default().read(&path).unwrap();
    for kind in SectionKind::ALL {
        assert_eq!(handle.header().section_length(kind), 0);
    }
    assert!(handle.verify_checksum().unwrap());
}

#[test]
fn windows_never_bleed_into_next_section() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bounds.rec");
    let audio = AudioStream::from_wav_bytes(wav(AudioFormat::pcm(8_000, 1, 16), 80)).unwrap();
    write_sample(&path, &audio, b"SCREEN");

    let handle = RecordingReader::default().read(&path).unwrap();
    let window = handle.audio_window();
    let mut buf = [0u8; 16];
    assert_eq!(window.read_at(window.len(), &mut buf).unwrap(), 0);

    let mut tail = window.try_clone().unwrap();
    tail.seek_to(window.len() - 2).unwrap();
    assert_eq!(tail.read(&mut buf).unwrap(), 2);

    let mut other = window.try_clone().unwrap();
    other.skip(5).unwrap();
    assert_eq!(tail.position(), window.len());
    assert_eq!(other.position(), 5);
}

#[test]
fn version_gate() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("v4.rec");
    write_sample(&path, &AudioStream::empty(), b"");

    let mut bytes = std::fs::read(&path).unwrap();
    bytes[0..4].copy_from_slice(&4u32.to_le_bytes());
    std::fs::write(&path, &bytes).unwrap();

    assert!(matches!(
        RecordingReader::default().read(&path),
        Err(RecordingError::IncompatibleFormat { expected: 3, actual: 4 })
    ));
    assert!(RecordingReader::new(ReaderConfig::new().expected_version(4))
        .read(&path)
        .is_ok());
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempdir().unwrap();
    let result = RecordingReader::default().read(dir.path().join("nope.rec"));
    assert!(matches!(result, Err(RecordingError::Storage(_))));
}

#[test]
fn checksum_is_deterministic_and_non_zero() {
    let dir = tempdir().unwrap();
    let audio = AudioStream::from_wav_bytes(wav(AudioFormat::pcm(8_000, 2, 16), 100)).unwrap();

    let first = dir.path().join("a.rec");
    let second = dir.path().join("b.rec");
    write_sample(&first, &audio, b"frames");
    write_sample(&second, &audio, b"frames");

    let reader = RecordingReader::default();
    let a = reader.read(&first).unwrap();
    let b = reader.read(&second).unwrap();
    assert_eq!(a.header().checksum, b.header().checksum);
    assert_ne!(a.header().checksum, [0u8; 32]);
    assert!(a.verify_checksum().unwrap());
}

#[test]
fn write_progress_is_monotonic() {
    let dir = tempdir().unwrap();
    let audio = AudioStream::from_wav_bytes(wav(AudioFormat::pcm(8_000, 1, 16), 4_000)).unwrap();
    let document = vec![7u8; 1_000];
    let mut seen = Vec::new();
    {
        let mut sink = |p: f32| seen.push(p);
        RecordingWriter::new(WriterConfig::new().chunk_size(512).sync_on_finish(false))
            .write(
                RecordingSections::new(&events(), &document, &audio),
                dir.path().join("p.rec"),
                Some(&mut sink),
            )
            .unwrap();
    }

    assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    assert!((seen.last().copied().unwrap() - 1.0).abs() < f32::EPSILON);
}

#[test]
fn resave_copies_tracks_through() {
    let dir = tempdir().unwrap();
    let original = dir.path().join("original.rec");
    let copy = dir.path().join("copy.rec");
    let audio = AudioStream::from_wav_bytes(wav(AudioFormat::pcm(8_000, 1, 16), 300)).unwrap();
    write_sample(&original, &audio, b"captured screen bytes");

    let handle = RecordingReader::default().read(&original).unwrap();
    let events = handle.parse_events::<EventLog>().unwrap();
    let document = handle.document().clone();
    let parts = handle.into_parts();
    let mut screen = parts.screen_capture;

    RecordingWriter::default()
        .write(
            RecordingSections::new(&events, &document, &parts.audio).with_screen_capture(&mut screen),
            &copy,
            None,
        )
        .unwrap();

    assert_eq!(std::fs::read(&original).unwrap(), std::fs::read(&copy).unwrap());
}

#[test]
fn seek_ms_on_loaded_recording() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cd.rec");
    let audio = AudioStream::from_wav_bytes(wav(AudioFormat::pcm(44_100, 1, 16), 66_150)).unwrap();
    write_sample(&path, &audio, b"");

    let mut handle = RecordingReader::default().read(&path).unwrap();
    let audio = handle.audio_mut();
    assert_eq!(audio.seek_ms(1_000).unwrap(), 88_200);

    // 10 ms later is 441 more samples.
    audio.skip(882).unwrap();
    let mut sample = [0u8; 2];
    audio.read(&mut sample).unwrap();
    assert_eq!(i16::from_le_bytes(sample), 44_541u32 as i16);
}

#[test]
fn export_from_loaded_recording() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("lecture.rec");
    let audio = AudioStream::from_wav_bytes(wav(AudioFormat::pcm(1_000, 1, 16), 1_000)).unwrap();
    write_sample(&path, &audio, b"");

    let mut handle = RecordingReader::default().read(&path).unwrap();
    handle.audio_mut().add_exclusive_millis(200, 700).unwrap();

    let out = dir.path().join("clip.wav");
    let summary = AudioExporter::new(ExportConfig::new().lead_in_silence_ms(0))
        .export_audio(handle.audio(), &out, None)
        .unwrap();
    assert_eq!(summary.duration_ms, 500);

    let samples: Vec<i16> = hound::WavReader::open(&out)
        .unwrap()
        .into_samples::<i16>()
        .map(Result::unwrap)
        .collect();
    assert_eq!(samples, (200..700).collect::<Vec<i16>>());
}

struct FrameCounter;

impl ScreenCaptureParser for FrameCounter {
    type Output = usize;

    fn parse(
        &self,
        stream: ScreenCaptureStream,
        mut progress: ProgressCallback<'_>,
    ) -> RecordingResult<usize> {
        let data = stream.read_all()?;
        if let Some(report) = progress.as_mut() {
            report(1.0);
        }
        Ok(data.split(|b| *b == b'|').count())
    }
}

#[test]
fn screen_capture_parses_in_background() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("screen.rec");
    write_sample(&path, &AudioStream::empty(), b"f1|f2|f3");

    let handle = RecordingReader::default().read(&path).unwrap();
    let task = handle
        .parse_screen_capture(FrameCounter, None::<fn(f32)>)
        .unwrap();

    assert_eq!(handle.parse_events::<EventLog>().unwrap(), events());
    assert_eq!(task.wait().unwrap(), 3);
}

#[test]
fn edited_recording_keeps_its_cut_after_resave() {
    let dir = tempdir().unwrap();
    let original = dir.path().join("original.rec");
    let edited = dir.path().join("edited.rec");
    let audio = AudioStream::from_wav_bytes(wav(AudioFormat::pcm(1_000, 1, 16), 1_000)).unwrap();
    write_sample(&original, &audio, b"frames");

    let mut handle = RecordingReader::default().read(&original).unwrap();
    handle.audio_mut().add_exclusion_millis(200, 700).unwrap();
    let events = handle.parse_events::<EventLog>().unwrap();
    let document = handle.document().clone();
    let mut parts = handle.into_parts();
    RecordingWriter::default()
        .write(
            RecordingSections::new(&events, &document, &parts.audio)
                .with_screen_capture(&mut parts.screen_capture),
            &edited,
            None,
        )
        .unwrap();

    let reloaded = RecordingReader::default().read(&edited).unwrap();
    assert_eq!(reloaded.duration_millis(), 500);
    assert_eq!(reloaded.screen_capture().read_all().unwrap(), b"frames");
    assert!(reloaded.verify_checksum().unwrap());

    let samples: Vec<i16> = hound::WavReader::new(reloaded.audio_window().try_clone().unwrap())
        .unwrap()
        .into_samples::<i16>()
        .map(Result::unwrap)
        .collect();
    assert_eq!(samples, (0..200).chain(700..1_000).collect::<Vec<i16>>());
}
