//! Parse input configuration file

use std::path::Path;
use yaml_rust::{YamlLoader, yaml::Yaml};
use evalexpr::*;

mod error;
mod types;
mod timing;

pub use error::*;
use types::*;
pub use timing::*;

/// Represents the input configuration, which defines values
/// for model parameters, and any automatic values
/// for those parameters.
pub struct Config {
    input: Yaml,
    ctx: HashMapContext,
}

impl Config {
    /// Loads a configuration file.
    /// Fails if the file cannot be opened or if it is not
    /// YAML-formatted.
    pub fn from_file(path: &Path) -> Result<Self, InputError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|_| InputError::file())?;
        Self::from_string(&contents)
    }

    /// Loads a YAML configuration from a string.
    /// Fails if the string is not formatted correctly.
    pub fn from_string(s: &str) -> Result<Self, InputError> {
        let input = YamlLoader::load_from_str(s)
            .map_err(|_| InputError::file())?;
        let input = input.first()
            .ok_or(InputError::file())?;

        Ok(Config {
            input: input.clone(),
            ctx: HashMapContext::new(),
        })
    }

    /// Loads automatic values for constants, special functions
    /// and keywords.
    /// Also loads and evaluates mathematical expressions
    /// that are given in the specified `section`.
    pub fn with_context(&mut self, section: &str) -> Result<&mut Self, InputError> {
        use helper::context_function;
        // Default constants: lengths in pc, velocities in km/s, ages in Gyr

        let mut ctx = context_map! {
            "pc" => 1.0,
            "kpc" => 1.0e3,
            "Gyr" => 1.0,
            "Myr" => 1.0e-3,
            "kms" => 1.0,
            "milli" => 1.0e-3,
            "micro" => 1.0e-6,
            "pi" => std::f64::consts::PI,
            "degree" => std::f64::consts::PI / 180.0,
        }.unwrap();

        context_function!(ctx, "sqrt",   f64::sqrt);
        context_function!(ctx, "cbrt",   f64::cbrt);
        context_function!(ctx, "abs",    f64::abs);
        context_function!(ctx, "exp",    f64::exp);
        context_function!(ctx, "ln",     f64::ln);
        context_function!(ctx, "sin",    f64::sin);
        context_function!(ctx, "cos",    f64::cos);
        context_function!(ctx, "tan",    f64::tan);
        context_function!(ctx, "asin",   f64::asin);
        context_function!(ctx, "acos",   f64::acos);
        context_function!(ctx, "atan",   f64::atan);
        context_function!(ctx, "atan2",  f64::atan2, 2);
        context_function!(ctx, "sinh",   f64::sinh);
        context_function!(ctx, "cosh",   f64::cosh);
        context_function!(ctx, "tanh",   f64::tanh);
        context_function!(ctx, "floor",  f64::floor);
        context_function!(ctx, "ceil",   f64::ceil);
        context_function!(ctx, "round",  f64::round);
        context_function!(ctx, "signum", f64::signum);

        self.ctx = ctx;

        // Read in from 'constants' block if it exists
        if self.input[section].is_badvalue() {
            return Ok(self);
        }

        for (a, b) in self.input[section].as_hash().unwrap() {
            // grab the value, if possible
            let (key, value) = match (a, b) {
                (Yaml::String(k), Yaml::Integer(i)) => (Some(k), Some(*i as f64)),
                (Yaml::String(k), Yaml::Real(s)) => (Some(k), s.parse::<f64>().ok()),
                (Yaml::String(k), Yaml::String(s)) => (Some(k), eval_number_with_context(s, &self.ctx).ok()),
                _ => (None, None),
            };

            // insert it into the context so it's available for the next read
            if let Some(v) = value {
                let key = key.unwrap(); // if value.is_some() so is key
                self.ctx.set_value(key.clone(), Value::from(v))
                    .map_err(|_| {
                        eprintln!("Failed to insert {} = {} from constants block into context.", key, v);
                        InputError::conversion(section, key)
                    })?
            } else if let Some(k) = key {
                // found a key, value pair but parsing failed
                Err(InputError::conversion(section, k))?
            }
        }

        Ok(self)
    }

    /// Locates a key-value pair in the configuration file and attempts
    /// to parse the value as the specified type.
    /// The path to the key-value pair is specified by a string of colon-separated
    /// sections, e.g. `'section:subsection:key'`.
    pub fn read<T, S>(&self, path: S) -> Result<T, InputError>
    where
        T: FromYaml,
        S: AsRef<str>,
    {
        let address: Vec<&str> = path.as_ref().split(':').collect();
        let value = address.iter()
          .try_fold(&self.input, |y, s| {
              if y[*s].is_badvalue() {
                  Err(InputError::location(path.as_ref(), s))
              } else {
                  Ok(&y[*s])
              }
          });
        value.and_then(|arg| T::from_yaml(arg.clone(), &self.ctx).map_err(|_| InputError::conversion(path.as_ref(), address.last().unwrap())))
    }

    /// Parses a string argument and evaluates it using the default context. Extends
    /// ```
    /// let arg = "2.0";
    /// let val = arg.parse::<f64>().unwrap();
    /// ```
    /// to handle mathematical expressions, e.g.
    /// ```
    /// let arg = "8.16 * kpc";
    /// let val = input.evaluate(arg).unwrap();
    /// ```
    /// using any constants specified in the input file.
    #[allow(unused)]
    pub fn evaluate<S: AsRef<str>>(&self, arg: S) -> Option<f64> {
        eval_number_with_context(arg.as_ref(), &self.ctx).ok()
    }
}

mod helper {
    macro_rules! context_function {
        ($ctx:expr, $name:literal, $func:expr) => {
            $ctx.set_function(
                $name.to_string(),
                Function::new(|arg| {
                    let x = arg.as_number()?;
                    Ok(Value::Float($func(x)))
                })
            ).unwrap()
        };
        ($ctx:expr, $name:literal, $func:expr, 2) => {
            $ctx.set_function(
                $name.to_string(),
                Function::new(|arg| {
                    let arg = arg.as_fixed_len_tuple(2)?;
                    let x = arg[0].as_number()?;
                    let y = arg[1].as_number()?;
                    Ok(Value::Float($func(x, y)))
                })
            ).unwrap()
        };
    }

    pub(super) use context_function;
}
