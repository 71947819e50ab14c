//! LLM narrative analysis of NWS data

pub mod analyzer;
pub mod llm;
pub mod perspective;

pub use analyzer::{AnalysisReport, AnalysisRequest, WeatherAnalyzer};
pub use llm::{AnthropicClient, ChatModel, ChatRequest, ChatResponse, TokenUsage};
pub use perspective::Perspective;
