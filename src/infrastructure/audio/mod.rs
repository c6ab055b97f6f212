mod openai_whisper_transcriber;

pub use openai_whisper_transcriber::OpenAiWhisperTranscriber;
