mod progress;
mod scheduler;
