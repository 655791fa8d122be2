use snowflake::SnowflakeIdGenerator;
use std::sync::Mutex;

struct Worker {
    machine_id: i32,
    node_id: i32,
    generator: SnowflakeIdGenerator,
}

static ID_GENERATOR: Mutex<Option<Worker>> = Mutex::new(None);

/// Largest machine or node identifier the generator accepts.
pub const MAX_WORKER_ID: i32 = 31;

/// 初始化 Snowflake ID 生成器
///
/// `machine_id`: 机器标识 (0-31)
/// `node_id`: 节点标识 (0-31)
///
/// Calling `init` again with the same pair keeps the running generator so its
/// sequence is never restarted within one process.
pub fn init(machine_id: i32, node_id: i32) {
    let mut gen = ID_GENERATOR.lock().unwrap_or_else(|e| e.into_inner());
    if let Some(w) = gen.as_ref() {
        if w.machine_id == machine_id && w.node_id == node_id {
            return;
        }
    }
    *gen = Some(Worker {
        machine_id,
        node_id,
        generator: SnowflakeIdGenerator::new(machine_id, node_id),
    });
}

/// 生成一个 Snowflake ID
///
/// Ids issued by one process are strictly increasing, so ordering rows by id
/// is equivalent to ordering them by creation.
pub fn next_id() -> i64 {
    let mut gen = ID_GENERATOR.lock().unwrap_or_else(|e| e.into_inner());
    let worker = gen.get_or_insert_with(|| Worker {
        machine_id: 1,
        node_id: 1,
        generator: SnowflakeIdGenerator::new(1, 1),
    });
    worker.generator.generate()
}
