use crate::block_generator::BlockPolicy;

pub trait Configuration: Clone + Send + Sync + 'static {
    fn port(&self) -> String;
    fn database_url(&self) -> Option<String>;
    fn database_pool_size(&self) -> u32;
    fn allow_empty_blocks(&self) -> bool;
    fn max_slots_per_block(&self) -> usize;

    fn block_policy(&self) -> BlockPolicy {
        BlockPolicy {
            allow_empty_blocks: self.allow_empty_blocks(),
            max_slots_per_block: self.max_slots_per_block(),
        }
    }
}
