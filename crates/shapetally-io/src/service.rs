//! Request orchestration: pipeline, artifact, description, payload.

use std::io;

use shapetally_export::{ExportError, ResultPayload, encode_jpeg};
use shapetally_pipeline::{Clock, PipelineDiagnostics, PipelineError, ProcessResult};

use crate::config::ServiceConfig;
use crate::describe::{ChatDescriber, Describer};
use crate::sink::{ArtifactSink, DirectorySink};

/// Errors that fail a whole analysis request.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The input was rejected by the pipeline.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// The annotated canvas could not be encoded.
    #[error(transparent)]
    Export(#[from] ExportError),

    /// The artifact could not be stored.
    #[error("failed to store artifact: {0}")]
    Sink(#[source] io::Error),
}

/// Outcome of one analysis request.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    /// Pipeline output, including the annotated canvas.
    pub result: ProcessResult,
    /// Encoded JPEG as written to the sink.
    pub jpeg: Vec<u8>,
    /// Serializable payload for the caller.
    pub payload: ResultPayload,
}

/// Analyzes images with fixed configuration and collaborators.
pub struct ShapeService {
    config: ServiceConfig,
    sink: Box<dyn ArtifactSink>,
    describer: Option<Box<dyn Describer>>,
}

impl std::fmt::Debug for ShapeService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShapeService")
            .field("config", &self.config)
            .field("describer", &self.describer.is_some())
            .finish_non_exhaustive()
    }
}

impl ShapeService {
    /// Service writing through `sink`, without descriptions.
    #[must_use]
    pub fn new(config: ServiceConfig, sink: Box<dyn ArtifactSink>) -> Self {
        Self {
            config,
            sink,
            describer: None,
        }
    }

    /// Attach a describer.
    #[must_use]
    pub fn with_describer(mut self, describer: Box<dyn Describer>) -> Self {
        self.describer = Some(describer);
        self
    }

    /// Service with a [`DirectorySink`] on `config.output_dir` and, when
    /// description settings are present, a [`ChatDescriber`].
    ///
    /// A describer that cannot be constructed is logged and left out.
    #[must_use]
    pub fn from_config(config: ServiceConfig) -> Self {
        let sink = Box::new(DirectorySink::new(config.output_dir.clone()));
        let describer = config.description.clone().and_then(|description| {
            match ChatDescriber::new(description) {
                Ok(describer) => {
                    let describer: Box<dyn Describer> =
                        Box::new(describer.with_locale(config.pipeline.locale));
                    Some(describer)
                }
                Err(err) => {
                    tracing::warn!(%err, "description client unavailable");
                    None
                }
            }
        });
        Self {
            config,
            sink,
            describer,
        }
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Analyze one image.
    ///
    /// Runs the pipeline, writes the annotated JPEG through the sink,
    /// then asks the describer (if any) for a description. A description
    /// failure is logged and leaves `description` empty.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Pipeline`] for invalid input (nothing is
    /// written), [`ServiceError::Export`] if encoding fails and
    /// [`ServiceError::Sink`] if the artifact cannot be stored.
    pub fn analyze(&self, image_bytes: &[u8]) -> Result<AnalysisReport, ServiceError> {
        let result = shapetally_pipeline::process(image_bytes, &self.config.pipeline)?;
        self.deliver(result)
    }

    /// Like [`analyze`](Self::analyze), also returning pipeline timings.
    ///
    /// # Errors
    ///
    /// Same as [`analyze`](Self::analyze).
    pub fn analyze_with_diagnostics<C: Clock>(
        &self,
        image_bytes: &[u8],
        clock: &C,
    ) -> Result<(AnalysisReport, PipelineDiagnostics), ServiceError> {
        let (result, diagnostics) = shapetally_pipeline::process_with_diagnostics(
            image_bytes,
            &self.config.pipeline,
            clock,
        )?;
        Ok((self.deliver(result)?, diagnostics))
    }

    fn deliver(&self, result: ProcessResult) -> Result<AnalysisReport, ServiceError> {
        let jpeg = encode_jpeg(&result.annotated, self.config.jpeg_quality)?;
        let reference = self
            .sink
            .write(&self.config.artifact_name, &jpeg)
            .map_err(ServiceError::Sink)?;
        let description = self.describe(&jpeg);

        let payload = ResultPayload::new(
            &result.counts,
            self.config.pipeline.locale,
            reference,
            description,
        );
        Ok(AnalysisReport {
            result,
            jpeg,
            payload,
        })
    }

    fn describe(&self, jpeg: &[u8]) -> Option<String> {
        let describer = self.describer.as_ref()?;
        match describer.describe(jpeg) {
            Ok(text) => Some(text),
            Err(err) => {
                tracing::warn!(%err, "description unavailable");
                None
            }
        }
    }
}
