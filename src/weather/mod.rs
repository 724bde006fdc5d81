pub mod grid;
pub mod provider;

pub use grid::{BoundingBox, WeatherGrid};
pub use provider::{ConstantWeatherProvider, WeatherProvider, WeatherSample};
