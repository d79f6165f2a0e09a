use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::io::{self, Write};

/// Label-to-address bindings collected in pass 1.
///
/// Lookups go through a map; a side list of names in definition order drives
/// the listing output. A label can only be defined once: `define` refuses to
/// rebind and hands the first definition's address back so the caller can
/// build its duplicate diagnostic. Matching is case-sensitive.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    addresses: HashMap<String, u16>,
    order: Vec<String>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `label` to `address`. On a duplicate the table is left untouched
    /// and the address of the first definition comes back as the error.
    pub fn define(&mut self, label: &str, address: u16) -> Result<(), u16> {
        match self.addresses.entry(label.to_string()) {
            Entry::Occupied(entry) => Err(*entry.get()),
            Entry::Vacant(entry) => {
                entry.insert(address);
                self.order.push(label.to_string());
                Ok(())
            }
        }
    }

    pub fn address_of(&self, label: &str) -> Option<u16> {
        self.addresses.get(label).copied()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Labels with their addresses, in definition order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, u16)> + '_ {
        self.order
            .iter()
            .map(|label| (label.as_str(), self.addresses[label.as_str()]))
    }

    /// Write the symbol listing shown after a successful assembly.
    pub fn write_listing<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "symbol           address")?;
        writeln!(out, "------           -------")?;
        for (label, address) in self.entries() {
            writeln!(out, "{label:<16} x{address:04X}")?;
        }
        Ok(())
    }
}
