pub mod bus;
pub mod channel;
pub mod listener;
pub mod loopback;

pub use bus::{BusSubscription, WeatherBus};
pub use channel::{DataEvent, DataEventBatch, DataMap, SyncChannel};
pub use listener::{extract_snapshot, BatchOutcome, WeatherSyncListener, TODAY_WEATHER_PATH};
pub use loopback::{ConnectBehavior, LoopbackChannel};
