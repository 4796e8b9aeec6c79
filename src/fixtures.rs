#[cfg(test)]
pub mod test {
    use confique::Config;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
    #[serde(rename_all = "lowercase")]
    pub enum SomeEnum {
        A,
        B,
    }

    /// One field of every supported kind.
    #[derive(Config, Deserialize, Debug, PartialEq)]
    pub struct FullConfig {
        pub a: String,
        pub b: i64,
        pub c: bool,
        pub d: bool,
        pub e: f64,
        pub enum_value: SomeEnum,
        pub f: Option<String>,
        pub g: Option<i32>,
        #[config(default = "default")]
        pub h: String,
    }

    #[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
    #[serde(rename_all = "lowercase")]
    pub enum Mode {
        Fast,
        Slow,
    }

    #[derive(Config, Deserialize, Debug, PartialEq)]
    pub struct ServerConfig {
        /// The application host.
        #[config(default = "localhost")]
        pub host: String,

        /// The port number.
        #[config(default = 8080)]
        pub port: u16,

        /// Enable debug mode.
        #[config(default = false)]
        pub debug: bool,

        #[config(default = "fast")]
        pub mode: Mode,

        /// Upstream URL.
        pub url: Option<String>,
    }

    // -- Nested sections are not bindable ---------------------------------------

    #[derive(Config, Deserialize, Debug, PartialEq)]
    pub struct NestedConfig {
        #[config(default = "localhost")]
        pub host: String,

        #[config(nested)]
        pub database: DbConfig,
    }

    #[derive(Config, Deserialize, Debug, PartialEq)]
    pub struct DbConfig {
        pub url: Option<String>,

        #[config(default = 5)]
        pub pool_size: usize,
    }

    // -- Fixtures for file and layering tests ------------------------------------

    #[derive(Config, Deserialize, Debug, PartialEq)]
    pub struct FloatIntConfig {
        pub float_val: f64,
        pub int_val: i64,
    }

    #[derive(Config, Deserialize, Debug, PartialEq)]
    pub struct FloatIntStrConfig {
        pub float_val: f64,
        pub int_val: i64,
        pub str_val: String,
    }
}
