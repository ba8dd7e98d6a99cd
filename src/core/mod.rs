//! Water-usage analysis: leak classification, guardian status, and bill
//! extraction.

pub mod doctor;
pub mod http;
pub mod leak;
pub mod logging;
pub mod models;
pub mod ocr;
pub mod parsers;
pub mod period;
pub mod pipeline;
pub mod status;
pub mod vision;

pub use doctor::{CheckStatus, DiagnosticCheck, DoctorReport};
pub use leak::{LeakAssessment, classify};
pub use models::{
    BillAnalysisInput, BillAnalysisRecord, ExtractionResult, GuardianStatus, LeakCheckInput,
    LeakCheckRecord, LeakConfidence, NewLeakCheck, RobotOutput, StatusLevel,
};
pub use ocr::{OcrEngine, TesseractEngine};
pub use pipeline::{ExtractionConfig, ExtractionOutcome, ExtractionPipeline, ExtractionStrategy};
pub use status::aggregate;
pub use vision::VisionClient;
