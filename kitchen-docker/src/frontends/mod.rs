mod kitchen_yaml;

pub use kitchen_yaml::{Instance, KitchenYamlFrontend};
