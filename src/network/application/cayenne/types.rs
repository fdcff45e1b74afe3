//! Data type and unit tags understood by the Cayenne dashboard.
//!
//! These are the strings placed before the `=` of a data payload, e.g.
//! `temp,c=30.5`. Any other tag may be used; the dashboard shows unknown
//! tags as generic values.

/// Analog sensor reading.
pub const ANALOG_SENSOR: &str = "analog_sensor";
/// Analog actuator state.
pub const ANALOG_ACTUATOR: &str = "analog_actuator";
/// Digital sensor reading.
pub const DIGITAL_SENSOR: &str = "digital_sensor";
/// Digital actuator state.
pub const DIGITAL_ACTUATOR: &str = "digital_actuator";
/// Barometric pressure.
pub const BAROMETRIC_PRESSURE: &str = "bp";
/// Battery level.
pub const BATTERY: &str = "batt";
/// Luminosity.
pub const LUMINOSITY: &str = "lum";
/// Proximity.
pub const PROXIMITY: &str = "prox";
/// Relative humidity.
pub const RELATIVE_HUMIDITY: &str = "rel_hum";
/// Temperature.
pub const TEMPERATURE: &str = "temp";
/// Voltage.
pub const VOLTAGE: &str = "voltage";
/// GPS position, value encoded `[lat,lon,alt]`.
pub const GPS: &str = "gps";

/// No unit.
pub const NULL: &str = "null";
/// Digital (0/1).
pub const DIGITAL: &str = "d";
/// Degrees Celsius.
pub const CELSIUS: &str = "c";
/// Degrees Fahrenheit.
pub const FAHRENHEIT: &str = "f";
/// Kelvin.
pub const KELVIN: &str = "k";
/// Lux.
pub const LUX: &str = "lux";
/// Hectopascal.
pub const HECTOPASCAL: &str = "hpa";
/// Pascal.
pub const PASCAL: &str = "pa";
/// Percent.
pub const PERCENT: &str = "p";
/// Meter.
pub const METER: &str = "m";
/// Centimeter.
pub const CENTIMETER: &str = "cm";
/// Volts.
pub const VOLTS: &str = "v";
