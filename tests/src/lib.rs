// Block import tests over the whole state transition: blocks are authored and sealed against an in-memory chain and
// applied through the runtime.

#[cfg(test)]
mod chain;
mod import;
mod safrole;
mod work_pipeline;
