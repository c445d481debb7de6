//! Writes a synthetic labeling dataset: 4-channel 16-bit cell images with
//! their event table, in the layout the viewer expects.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, Int32Array, Int64Array, ListBuilder, UInt16Builder};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use clap::Parser;
use parquet::arrow::ArrowWriter;
use parquet::file::metadata::KeyValue;
use parquet::file::properties::WriterProperties;

const HEIGHT: usize = 32;
const WIDTH: usize = 32;
const CHANNELS: usize = 4;

#[derive(Parser, Debug)]
#[command(about = "Generate a sample dataset for tile-labeler")]
struct Args {
    /// Number of events
    #[arg(short, long, default_value_t = 500)]
    events: usize,

    /// Output file
    #[arg(default_value = "sample_events.parquet")]
    output: PathBuf,
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }
}

/// One round blob per channel at a shared centre, plus background noise.
struct Event {
    cx: f64,
    cy: f64,
    radius: f64,
    brightness: [f64; CHANNELS],
}

impl Event {
    fn random(rng: &mut SimpleRng) -> Self {
        let mut brightness = [0.0; CHANNELS];
        for b in &mut brightness {
            // some channels stay near background
            *b = if rng.next_f64() < 0.4 { rng.range(0.0, 4000.0) } else { rng.range(8000.0, 60000.0) };
        }
        Event {
            cx: rng.range(10.0, WIDTH as f64 - 10.0),
            cy: rng.range(10.0, HEIGHT as f64 - 10.0),
            radius: rng.range(2.5, 8.0),
            brightness,
        }
    }

    fn render(&self, rng: &mut SimpleRng, out: &mut UInt16Builder) -> f64 {
        let mut total = 0.0;
        for y in 0..HEIGHT {
            for x in 0..WIDTH {
                let d2 = (x as f64 - self.cx).powi(2) + (y as f64 - self.cy).powi(2);
                let falloff = (-d2 / (2.0 * self.radius.powi(2))).exp();
                for c in 0..CHANNELS {
                    let v = self.brightness[c] * falloff + rng.range(0.0, 1500.0);
                    total += v;
                    out.append_value(v.min(u16::MAX as f64) as u16);
                }
            }
        }
        total / (HEIGHT * WIDTH * CHANNELS) as f64
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut rng = SimpleRng::new(42);

    let mut images = ListBuilder::new(UInt16Builder::new());
    let mut ids = Vec::with_capacity(args.events);
    let mut frames = Vec::with_capacity(args.events);
    let mut areas = Vec::with_capacity(args.events);
    let mut means = Vec::with_capacity(args.events);

    for i in 0..args.events {
        let event = Event::random(&mut rng);
        let mean = event.render(&mut rng, images.values());
        images.append(true);

        ids.push(i as i64);
        frames.push((i / 50) as i32 + 1);
        areas.push(std::f64::consts::PI * event.radius.powi(2));
        means.push(mean);
    }

    let schema = Arc::new(Schema::new(vec![
        Field::new("event_id", DataType::Int64, false),
        Field::new("frame_id", DataType::Int32, false),
        Field::new(
            "image",
            DataType::List(Arc::new(Field::new("item", DataType::UInt16, true))),
            false,
        ),
        Field::new("area", DataType::Float64, false),
        Field::new("mean_intensity", DataType::Float64, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Int64Array::from(ids)),
            Arc::new(Int32Array::from(frames)),
            Arc::new(images.finish()),
            Arc::new(Float64Array::from(areas)),
            Arc::new(Float64Array::from(means)),
        ],
    )
    .context("building record batch")?;

    let props = WriterProperties::builder()
        .set_key_value_metadata(Some(vec![KeyValue::new(
            "image_shape".to_string(),
            format!("{HEIGHT},{WIDTH},{CHANNELS}"),
        )]))
        .build();

    let file = std::fs::File::create(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, Some(props))?;
    writer.write(&batch)?;
    writer.close()?;

    println!(
        "Wrote {} events ({HEIGHT}x{WIDTH}x{CHANNELS} each) to {}",
        args.events,
        args.output.display()
    );
    Ok(())
}
