//! Key command bindings
//!
//! Maps host key codes to game commands with a per-binding fire interval, so
//! a held fire key repeats at its own cadence instead of once per tick. The
//! host feeds key-down/key-up transitions and polls once per tick; the table
//! never touches the real clock, the host supplies timestamps.

use std::error::Error;
use std::fmt;

/// Host keyboard key code.
///
/// The numeric values only need to agree with whatever windowing layer feeds
/// [`KeyCommandTable::press`]; the constants below use ASCII for letters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyCode(pub u16);

impl KeyCode {
    pub const W: Self = Self(b'W' as u16);
    pub const A: Self = Self(b'A' as u16);
    pub const S: Self = Self(b'S' as u16);
    pub const D: Self = Self(b'D' as u16);
    pub const E: Self = Self(b'E' as u16);
    pub const SPACE: Self = Self(b' ' as u16);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputError {
    /// The key already has a binding in this table.
    DuplicateKey(KeyCode),
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputError::DuplicateKey(key) => {
                write!(f, "key {} is already bound to a command", key.0)
            }
        }
    }
}

impl Error for InputError {}

#[derive(Debug)]
struct Binding<C> {
    key: KeyCode,
    command: C,
    /// Minimum milliseconds between repeat fires; zero repeats every poll.
    fire_interval_ms: u64,
    last_fired_ms: Option<u64>,
    down: bool,
}

/// One-key-per-command binding table with repeat throttling.
#[derive(Debug, Default)]
pub struct KeyCommandTable<C> {
    bindings: Vec<Binding<C>>,
}

impl<C: Copy> KeyCommandTable<C> {
    pub fn new() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }

    /// Bind a key to a command. A key can carry only one binding.
    pub fn bind(
        &mut self,
        key: KeyCode,
        command: C,
        fire_interval_ms: u64,
    ) -> Result<(), InputError> {
        if self.bindings.iter().any(|b| b.key == key) {
            return Err(InputError::DuplicateKey(key));
        }
        self.bindings.push(Binding {
            key,
            command,
            fire_interval_ms,
            last_fired_ms: None,
            down: false,
        });
        Ok(())
    }

    /// Record a key-down transition. Unbound keys are ignored.
    pub fn press(&mut self, key: KeyCode) {
        if let Some(binding) = self.bindings.iter_mut().find(|b| b.key == key) {
            binding.down = true;
        }
    }

    /// Record a key-up transition, re-arming the first-fire behavior.
    pub fn release(&mut self, key: KeyCode) {
        if let Some(binding) = self.bindings.iter_mut().find(|b| b.key == key) {
            binding.down = false;
            binding.last_fired_ms = None;
        }
    }

    /// Commands due this poll at timestamp `now_ms`.
    ///
    /// A freshly pressed key fires immediately; after that it repeats only
    /// when its fire interval has elapsed.
    pub fn poll(&mut self, now_ms: u64) -> Vec<C> {
        let mut fired = Vec::new();
        for binding in self.bindings.iter_mut().filter(|b| b.down) {
            let due = match binding.last_fired_ms {
                None => true,
                Some(last) => now_ms.saturating_sub(last) >= binding.fire_interval_ms,
            };
            if due {
                binding.last_fired_ms = Some(now_ms);
                fired.push(binding.command);
            }
        }
        fired
    }
}
