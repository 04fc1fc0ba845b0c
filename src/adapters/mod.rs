//! Adapters: concrete implementations of the port traits.
//!
//! | Adapter    | Implements                 | Connects to               |
//! |------------|----------------------------|---------------------------|
//! | `log_sink` | EventSink, TelemetrySink   | `log` facade              |
//! | `sim`      | SetDutyCycle (PWM)         | in-memory pulse recorder  |
//! |            | EncodedMotorPort           | integrating motor model   |
//! |            | SwervePort                 | request recorder          |

pub mod log_sink;
pub mod sim;
