use crate::callable::NativeFunction;
use crate::environment::{Environment, ScopeId};
use crate::error::RuntimeError;
use crate::value::Value;
use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Declares `print` and `time` as constants in `scope`.
pub fn register(environment: &mut Environment, scope: ScopeId) -> Result<(), RuntimeError> {
    for native in vec![print(), time()] {
        let name = native.name.clone();
        environment.declare_var(scope, &name, Value::NativeFunction(native), true)?;
    }
    Ok(())
}

/// `print(...)` writing to stdout.
pub fn print() -> NativeFunction {
    NativeFunction::new("print", |args, _, _| {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        write_line(&mut out, args)
    })
}

/// `print(...)` writing to a shared sink instead of stdout.
pub fn print_to<W: Write + 'static>(sink: Rc<RefCell<W>>) -> NativeFunction {
    NativeFunction::new("print", move |args, _, _| {
        write_line(&mut *sink.borrow_mut(), args)
    })
}

/// `time()`: milliseconds since the Unix epoch.
pub fn time() -> NativeFunction {
    NativeFunction::new("time", |_, _, _| {
        let elapsed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| failure("time", e))?;
        Ok(Value::Number(elapsed.as_millis() as f64))
    })
}

fn write_line(out: &mut dyn Write, args: &[Value]) -> Result<Value, RuntimeError> {
    let line = args
        .iter()
        .map(|arg| arg.to_string())
        .collect::<Vec<String>>()
        .join(" ");
    writeln!(out, "{}", line).map_err(|e| failure("print", e))?;
    Ok(Value::Null)
}

fn failure<E: std::error::Error>(name: &str, e: E) -> RuntimeError {
    RuntimeError::NativeFailure {
        name: name.to_string(),
        message: e.to_string(),
    }
}
