// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Caching video transcripts and dropping them when a domain event is published.
//!
//! Run with `cargo run --example transcripts` to see the `cache.event` log records.

use stratum::{ByteSize, Cache, EventBroker};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum ServerEvent {
    VideoUploaded,
    VideoStateChange,
}

#[derive(Clone, Debug)]
struct Transcript {
    language: String,
    text: String,
}

impl ByteSize for Transcript {
    fn heap_size(&self) -> usize {
        self.language.heap_size() + self.text.heap_size()
    }
}

fn transcribe(video: u64) -> Transcript {
    Transcript {
        language: "en".to_string(),
        text: format!("transcript of video {video}"),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let subscriber = tracing_subscriber::fmt().with_max_level(tracing::Level::DEBUG).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let broker = EventBroker::<ServerEvent>::new();
    let cache = Cache::builder::<u64, Transcript, ServerEvent>()
        .name("transcripts")
        .max_bytes(512)
        .build(&broker);

    for video in 1..=3 {
        let transcript = cache.get_or_insert_with(&video, Some(ServerEvent::VideoUploaded), || transcribe(video));
        println!("video {video}: {} ({})", transcript.text, transcript.language);
    }
    cache.insert(&100, transcribe(100), Some(ServerEvent::VideoStateChange));
    println!("{} transcripts use {} of {} bytes", cache.len(), cache.current_bytes(), cache.max_bytes());

    // A new upload makes every transcript tagged with it stale.
    broker.publish(&ServerEvent::VideoUploaded, None)?;
    println!("after upload event: {} transcripts remain", cache.len());

    match cache.get(&1) {
        Ok(transcript) => println!("unexpected hit: {}", transcript.text),
        Err(miss) => println!("{miss}"),
    }
    Ok(())
}
