use std::path::Path;
use std::str::FromStr;

use crate::core::processors::Signature;
use crate::core::rpileup::pileup::MismatchPolicy;

pub fn path(rawpath: &str) -> Result<(), String> {
    if !Path::new(rawpath).exists() {
        return Err(format!("{} file doesn't exist or there is no permission to read it", rawpath));
    }
    Ok(())
}

/// Output prefix: the parent folder must exist.
pub fn prefix(rawpath: &str) -> Result<(), String> {
    match Path::new(rawpath).parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.is_dir() => {
            Err(format!("Output folder {} doesn't exist", parent.display()))
        }
        _ => Ok(()),
    }
}

pub fn policy(policy: &str) -> Result<(), String> {
    MismatchPolicy::from_str(policy).map(|_| ())
}

pub fn signatures(signatures: &str) -> Result<(), String> {
    for s in signatures.split(',') {
        Signature::from_str(s.trim()).map_err(|e| e.to_string())?;
    }
    Ok(())
}

pub fn numeric<T>(low: T, upper: T) -> impl Fn(&str) -> Result<(), String>
where
    T: FromStr + std::fmt::Display + std::cmp::PartialOrd + Sized,
{
    move |val: &str| -> Result<(), String> {
        let number = val.parse::<T>().map_err(|_| format!("failed to parse {}", val))?;
        if number < low || number > upper {
            return Err(format!("Value {} is expected to be inside [{}, {}] range", val, low, upper));
        }
        Ok(())
    }
}
