//! Moving averages, dispersion and the stochastic oscillator over prices.

use super::{WindowSpec, generator_identity};
use crate::domain::error::InsightError;
use crate::domain::generator::InsightGenerator;
use crate::domain::insight::Insight;
use crate::domain::instrument::DerivativeView;
use crate::domain::ohlcv::PricePoint;
use crate::domain::options::{OptionReader, OptionValue, Options, option_map, resolve_options};
use crate::domain::rolling::{ema, rolling_mean, rolling_std, stochastic};
use crate::domain::series::Frame;

pub const KIND: &str = "RollingPrice";

fn centred_window(window: i64) -> OptionValue {
    OptionValue::Map(option_map([
        ("window", OptionValue::Int(window)),
        ("offset", OptionValue::Null),
    ]))
}

pub fn defaults() -> Options {
    option_map([
        ("price_point", OptionValue::Text("close".into())),
        ("ma", centred_window(14)),
        ("std", centred_window(14)),
        (
            "stoch",
            OptionValue::Map(option_map([("window", OptionValue::Int(5))])),
        ),
    ])
}

#[derive(Debug)]
pub struct RollingPriceGenerator {
    name: String,
    options: Options,
    price_point: PricePoint,
    ma: WindowSpec,
    std: WindowSpec,
    stoch_window: usize,
}

impl RollingPriceGenerator {
    pub fn new(name: impl Into<String>, overrides: &Options) -> Result<Self, InsightError> {
        let name = name.into();
        let options = resolve_options(&name, defaults(), overrides)?;
        let reader = OptionReader::new(&name, &options);

        let price_point = reader
            .text("price_point")?
            .unwrap_or("close")
            .parse::<PricePoint>()
            .map_err(|e| InsightError::configuration(&name, "price_point", e))?;
        let ma = WindowSpec::read(&reader.nested("ma")?)?;
        let std = WindowSpec::read(&reader.nested("std")?)?;
        let stoch_window = reader.nested("stoch")?.count("window")?;

        Ok(Self {
            name,
            options,
            price_point,
            ma,
            std,
            stoch_window,
        })
    }
}

impl InsightGenerator for RollingPriceGenerator {
    generator_identity!();

    fn generate(&self, derivative: &dyn DerivativeView) -> Result<Insight, InsightError> {
        let bars = derivative.values();
        let prices: Vec<f64> = bars.iter().map(|b| b.price(self.price_point)).collect();
        if let Some(bar) = bars.iter().find(|b| !b.price(self.price_point).is_finite()) {
            return Err(InsightError::NonNumeric {
                date: bar.date,
                value: bar.price(self.price_point),
            });
        }

        let mut frame = Frame::new(bars.iter().map(|b| b.date).collect());
        frame.push_column(
            self.price_point.to_string(),
            prices.iter().copied().map(Some).collect(),
        )?;
        frame.push_column("MA", rolling_mean(&prices, self.ma.window, self.ma.offset))?;
        frame.push_column("EMA", ema(&prices, self.ma.window, self.ma.offset))?;
        frame.push_column("Std", rolling_std(&prices, self.std.window, self.std.offset))?;
        let (k, d) = stochastic(bars, self.stoch_window);
        frame.push_column("%K", k)?;
        frame.push_column("%D", d)?;
        Ok(Insight::Frame(frame))
    }
}

pub fn create(name: String, overrides: Options) -> Result<Box<dyn InsightGenerator>, InsightError> {
    Ok(Box::new(RollingPriceGenerator::new(name, &overrides)?))
}
