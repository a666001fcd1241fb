// SPDX-License-Identifier: MIT OR Apache-2.0
//! Minimal text pipeline: a buffer node feeding an upper-casing filter.
//!
//! Run with `RUST_LOG=debug` to watch the connection and update dispatch.

use driftflow_core::{read_as, share, NodeRegistry, Pipeline};
use driftflow_text::{register, TextContainer};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut registry = NodeRegistry::new();
    register(&mut registry);

    let mut pipeline = Pipeline::new();
    let buffer = {
        let node = registry.instantiate("text.buffer").expect("registered type");
        let id = node.id();
        pipeline.add(node);
        id
    };
    let upper = {
        let node = registry.instantiate("text.uppercase").expect("registered type");
        let id = node.id();
        pipeline.add(node);
        id
    };

    let seed = TextContainer::from_lines(["hello dataflow", "ports and tags"]);
    pipeline
        .output_strategy(pipeline.output(buffer, "out"))
        .adopt(share(seed))
        .expect("fresh buffer has no representation yet");

    pipeline
        .connect(pipeline.output(buffer, "out"), pipeline.input(upper, "in"))
        .expect("text output matches text input");

    pipeline.update(upper).expect("pipeline is fully wired");

    let resource = pipeline
        .output_strategy(pipeline.output(upper, "out"))
        .resource()
        .expect("filter produced an output");
    let result = read_as::<TextContainer>(&resource).expect("text representation");
    for line in result.lines() {
        println!("{line}");
    }
}
