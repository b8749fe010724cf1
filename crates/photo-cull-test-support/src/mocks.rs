//! Mock implementations of core port traits.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use photo_cull_core::domain::{AnalysisResult, ImageInfo, Region};
use photo_cull_core::ports::{
    PhotoSource, ProgressEvent, ProgressSink, RawDecoder, ResultOutput, SidecarWriter,
    SubjectDetector,
};
use photo_cull_core::sidecar::SidecarDocument;

/// Mock `RawDecoder` serving pre-built rasters by path.
///
/// Unknown paths fail to decode, which exercises failure isolation.
#[derive(Default)]
pub struct MockRawDecoder {
    images: HashMap<PathBuf, ImageInfo>,
    decode_count: Arc<Mutex<usize>>,
}

impl MockRawDecoder {
    /// Creates an empty decoder; every path fails.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `image` under `path`.
    #[must_use]
    pub fn with_image(mut self, path: impl Into<PathBuf>, image: ImageInfo) -> Self {
        let path = path.into();
        let image = ImageInfo::new(path.display().to_string(), image.image);
        self.images.insert(path, image);
        self
    }

    /// Number of decode calls so far.
    #[must_use]
    pub fn decode_count(&self) -> usize {
        *self
            .decode_count
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl RawDecoder for MockRawDecoder {
    fn decode(&self, path: &Path) -> anyhow::Result<ImageInfo> {
        *self
            .decode_count
            .lock()
            .unwrap_or_else(PoisonError::into_inner) += 1;
        self.images
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("cannot decode {}", path.display()))
    }
}

/// Mock `SubjectDetector` returning a fixed set of regions for every photo.
#[derive(Debug, Clone, Default)]
pub struct MockSubjectDetector {
    regions: Vec<Region>,
}

impl MockSubjectDetector {
    /// Detector that finds `regions` in every photo.
    #[must_use]
    pub const fn new(regions: Vec<Region>) -> Self {
        Self { regions }
    }

    /// Detector that never finds a subject.
    #[must_use]
    pub const fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Detector that finds one subject covering the centre of the frame.
    #[must_use]
    pub fn centered(width: u32, height: u32) -> Self {
        Self::new(vec![Region::new(width / 4, height / 4, width / 2, height / 2)])
    }
}

impl SubjectDetector for MockSubjectDetector {
    fn detect(&self, _image: &ImageInfo) -> anyhow::Result<Vec<Region>> {
        Ok(self.regions.clone())
    }
}

/// `SubjectDetector` that fails on every call.
#[derive(Debug, Clone, Default)]
pub struct FailingDetector;

impl SubjectDetector for FailingDetector {
    fn detect(&self, _image: &ImageInfo) -> anyhow::Result<Vec<Region>> {
        anyhow::bail!("detector exploded")
    }
}

/// Mock implementation of `PhotoSource` over a fixed path list.
pub struct MockPhotoSource {
    paths: Vec<PathBuf>,
}

impl MockPhotoSource {
    /// Creates a source yielding `paths` in order.
    #[must_use]
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }

    /// Creates an empty source.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(vec![])
    }
}

impl PhotoSource for MockPhotoSource {
    fn photos(&self) -> Box<dyn Iterator<Item = anyhow::Result<PathBuf>> + Send + '_> {
        Box::new(self.paths.iter().cloned().map(Ok))
    }

    fn count_hint(&self) -> Option<usize> {
        Some(self.paths.len())
    }
}

/// Mock implementation of `ResultOutput` for testing.
///
/// Captures results for later assertions.
#[derive(Default)]
pub struct MockResultOutput {
    results: Arc<Mutex<Vec<AnalysisResult>>>,
    finish_count: Arc<Mutex<usize>>,
}

impl MockResultOutput {
    /// Creates a new mock output.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all captured results.
    #[must_use]
    pub fn results(&self) -> Vec<AnalysisResult> {
        self.results
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the number of times `finish()` was called.
    #[must_use]
    pub fn finish_count(&self) -> usize {
        *self
            .finish_count
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl ResultOutput for MockResultOutput {
    fn write(&self, result: &AnalysisResult) -> anyhow::Result<()> {
        self.results
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(result.clone());
        Ok(())
    }

    fn finish(&self) -> anyhow::Result<()> {
        *self
            .finish_count
            .lock()
            .unwrap_or_else(PoisonError::into_inner) += 1;
        Ok(())
    }
}

/// Mock implementation of `ProgressSink` for testing.
///
/// Captures events for later assertions.
#[derive(Default)]
pub struct MockProgressSink {
    events: Arc<Mutex<Vec<ProgressEvent>>>,
}

impl MockProgressSink {
    /// Creates a new mock progress sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all captured events.
    #[must_use]
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the number of `Started` events.
    #[must_use]
    pub fn started_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, ProgressEvent::Started { .. }))
            .count()
    }

    /// Returns the number of `Completed` events.
    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, ProgressEvent::Completed { .. }))
            .count()
    }

    /// Returns `(processed, failed, selected)` from the `Finished` event, if any.
    #[must_use]
    pub fn finished_counts(&self) -> Option<(usize, usize, usize)> {
        self.events().iter().find_map(|e| match e {
            ProgressEvent::Finished {
                processed,
                failed,
                selected,
            } => Some((*processed, *failed, *selected)),
            _ => None,
        })
    }
}

impl ProgressSink for MockProgressSink {
    fn on_event(&self, event: ProgressEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

/// Mock `SidecarWriter` keeping documents in memory.
#[derive(Default)]
pub struct MockSidecarWriter {
    written: Arc<Mutex<Vec<(PathBuf, SidecarDocument)>>>,
}

impl MockSidecarWriter {
    /// Creates a new mock writer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every `(sidecar path, document)` written so far.
    #[must_use]
    pub fn written(&self) -> Vec<(PathBuf, SidecarDocument)> {
        self.written
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl SidecarWriter for MockSidecarWriter {
    fn write(&self, source: &Path, document: &SidecarDocument) -> anyhow::Result<PathBuf> {
        let path = source.with_extension("xmp");
        self.written
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((path.clone(), document.clone()));
        Ok(path)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::SyntheticImageBuilder;
    use photo_cull_core::sidecar::SidecarGenerator;

    #[test]
    fn test_mock_decoder_known_and_unknown() {
        let decoder =
            MockRawDecoder::new().with_image("a.arw", SyntheticImageBuilder::sharp_photo());
        let info = decoder.decode(Path::new("a.arw")).unwrap();
        assert_eq!(info.path, "a.arw");
        assert!(decoder.decode(Path::new("b.arw")).is_err());
        assert_eq!(decoder.decode_count(), 2);
    }

    #[test]
    fn test_mock_detectors() {
        let image = SyntheticImageBuilder::sharp_photo();
        assert_eq!(MockSubjectDetector::centered(160, 120).detect(&image).unwrap().len(), 1);
        assert!(MockSubjectDetector::empty().detect(&image).unwrap().is_empty());
        assert!(FailingDetector.detect(&image).is_err());
    }

    #[test]
    fn test_mock_photo_source() {
        let source = MockPhotoSource::new(vec![PathBuf::from("a.nef")]);
        assert_eq!(source.count_hint(), Some(1));
        assert_eq!(source.photos().count(), 1);
        assert_eq!(MockPhotoSource::empty().photos().count(), 0);
    }

    #[test]
    fn test_mock_result_output() {
        let output = MockResultOutput::new();
        output
            .write(&AnalysisResult::failed("test.cr2", "boom"))
            .unwrap();
        output.finish().unwrap();

        assert_eq!(output.results().len(), 1);
        assert_eq!(output.results()[0].path, "test.cr2");
        assert_eq!(output.finish_count(), 1);
    }

    #[test]
    fn test_mock_progress_sink() {
        let sink = MockProgressSink::new();
        sink.on_event(ProgressEvent::Started {
            path: "test.cr2".into(),
            index: 0,
            total: Some(1),
        });
        sink.on_event(ProgressEvent::Finished {
            processed: 1,
            failed: 0,
            selected: 1,
        });

        assert_eq!(sink.started_count(), 1);
        assert_eq!(sink.completed_count(), 0);
        assert_eq!(sink.finished_counts(), Some((1, 0, 1)));
    }

    #[test]
    fn test_mock_sidecar_writer() {
        let writer = MockSidecarWriter::new();
        let document = SidecarGenerator::default().generate(2.0);
        let path = writer.write(Path::new("dir/a.arw"), &document).unwrap();
        assert_eq!(path, PathBuf::from("dir/a.xmp"));
        assert_eq!(writer.written().len(), 1);
    }
}
