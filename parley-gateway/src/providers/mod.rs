pub mod openai_compatible;
pub mod provider;

pub use openai_compatible::OpenAiCompatibleClient;
pub use provider::{
    GenerationOptions, Provider, ProviderContentBlock, ProviderError, ProviderResponse,
    ProviderUsage,
};
