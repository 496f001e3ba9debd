pub mod azure_openai;
