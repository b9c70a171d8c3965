use tracing::{debug, info};

use crate::{
    disk::{Block, BLOCKS_PER_DISK, BLOCK_SIZE, DISK_COUNT},
    error::ValidationError,
};

pub const MIN_CACHE_ENTRIES: usize = 2;
pub const MAX_CACHE_ENTRIES: usize = 4096;

type Result<T> = std::result::Result<T, ValidationError>;

#[derive(Debug, Clone)]
struct CacheEntry {
    valid: bool,
    disk: u32,
    block: u32,
    data: Block,
    access_time: u64, // 最近一次访问时的时钟值，越小越久未用
}

impl CacheEntry {
    fn empty() -> Self {
        Self {
            valid: false,
            disk: 0,
            block: 0,
            data: [0u8; BLOCK_SIZE],
            access_time: 0,
        }
    }

    fn holds(&self, disk: u32, block: u32) -> bool {
        self.valid && self.disk == disk && self.block == block
    }
}

/// 查找结果。未命中是正常情况，不算错误
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheLookup {
    Hit,
    Miss,
}

/// 固定容量的 LRU 块缓存，以 (disk, block) 为键。
///
/// 缓存先 `create` 才能使用，`destroy` 后回到未启用状态。
/// 同一坐标任何时刻最多只有一个有效条目。
#[derive(Debug, Default)]
pub struct BlockCache {
    entries: Vec<CacheEntry>, // 为空表示缓存未启用
    clock: u64,
    queries: u64,
    hits: u64,
}

impl BlockCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建一个启用的缓存
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        let mut cache = Self::new();
        cache.create(capacity)?;
        Ok(cache)
    }

    pub fn create(&mut self, capacity: usize) -> Result<()> {
        check_capacity(capacity)?;
        if self.is_enabled() {
            return Err(ValidationError::CacheAlreadyActive);
        }
        self.entries = vec![CacheEntry::empty(); capacity];
        info!(capacity, "block cache created");
        Ok(())
    }

    pub fn destroy(&mut self) -> Result<()> {
        if !self.is_enabled() {
            return Err(ValidationError::CacheNotActive);
        }
        self.entries = Vec::new();
        self.clock = 0;
        self.queries = 0;
        self.hits = 0;
        info!("block cache destroyed");
        Ok(())
    }

    /// 换成新容量的空缓存。容量不合法时保持原缓存不动
    pub fn recreate(&mut self, capacity: usize) -> Result<()> {
        check_capacity(capacity)?;
        if self.is_enabled() {
            self.destroy()?;
        }
        self.create(capacity)
    }

    pub fn is_enabled(&self) -> bool {
        !self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    /// 当前有效条目数
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| e.valid).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 查询某坐标是否在缓存中，不计入统计也不影响 LRU 顺序
    pub fn contains(&self, disk: u32, block: u32) -> bool {
        self.entries.iter().any(|e| e.holds(disk, block))
    }

    /// 命中时把块拷进 `out` 并把该条目标为最近使用。
    /// 每次调用都计入查询数，参数非法或缓存未启用时返回错误。
    pub fn lookup(&mut self, disk: u32, block: u32, out: &mut Block) -> Result<CacheLookup> {
        self.queries += 1;
        self.check(disk, block)?;

        let Some(entry) = self.entries.iter_mut().find(|e| e.holds(disk, block)) else {
            return Ok(CacheLookup::Miss);
        };
        self.hits += 1;
        self.clock += 1;
        out.copy_from_slice(&entry.data);
        entry.access_time = self.clock;
        Ok(CacheLookup::Hit)
    }

    /// 已缓存的块覆盖成新内容并刷新访问时间；不在缓存里时什么都不做
    pub fn update(&mut self, disk: u32, block: u32, buf: &Block) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.holds(disk, block)) {
            self.clock += 1;
            entry.data.copy_from_slice(buf);
            entry.access_time = self.clock;
        }
    }

    /// 插入新块，必要时淘汰访问时间最小的条目（并列时取下标最小的）。
    /// 新条目的访问时间取当前时钟的下一拍，不会马上成为淘汰对象。
    pub fn insert(&mut self, disk: u32, block: u32, buf: &Block) -> Result<()> {
        self.check(disk, block)?;
        if self.contains(disk, block) {
            return Err(ValidationError::AlreadyCached { disk, block });
        }

        // min_by_key 在并列时返回第一个元素
        let Some(victim) = self.entries.iter_mut().min_by_key(|e| e.access_time) else {
            return Err(ValidationError::CacheNotActive);
        };
        if victim.valid {
            debug!(
                disk = victim.disk,
                block = victim.block,
                access_time = victim.access_time,
                "evicting cached block"
            );
        }

        self.clock += 1;
        victim.valid = true;
        victim.disk = disk;
        victim.block = block;
        victim.data.copy_from_slice(buf);
        victim.access_time = self.clock;
        Ok(())
    }

    pub fn queries(&self) -> u64 {
        self.queries
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// 命中率；还没有任何查询时没有定义
    pub fn hit_rate(&self) -> Option<f64> {
        (self.queries > 0).then(|| self.hits as f64 / self.queries as f64)
    }

    pub fn hit_rate_report(&self) -> String {
        let report = match self.hit_rate() {
            Some(rate) => format!(
                "Hit rate: {:5.1}% ({} hits / {} queries)",
                rate * 100.0,
                self.hits,
                self.queries
            ),
            None => "Hit rate: n/a (no queries)".to_string(),
        };
        info!("{report}");
        report
    }

    fn check(&self, disk: u32, block: u32) -> Result<()> {
        if !self.is_enabled() {
            return Err(ValidationError::CacheNotActive);
        }
        if disk as usize >= DISK_COUNT || block as usize >= BLOCKS_PER_DISK {
            return Err(ValidationError::InvalidCoordinates { disk, block });
        }
        Ok(())
    }
}

fn check_capacity(capacity: usize) -> Result<()> {
    if !(MIN_CACHE_ENTRIES..=MAX_CACHE_ENTRIES).contains(&capacity) {
        return Err(ValidationError::InvalidCapacity(capacity));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(byte: u8) -> Block {
        [byte; BLOCK_SIZE]
    }

    #[test]
    fn create_checks_capacity_and_state() {
        let mut cache = BlockCache::new();
        assert!(!cache.is_enabled());
        assert_eq!(cache.create(1), Err(ValidationError::InvalidCapacity(1)));
        assert_eq!(
            cache.create(4097),
            Err(ValidationError::InvalidCapacity(4097))
        );
        assert_eq!(cache.destroy(), Err(ValidationError::CacheNotActive));

        cache.create(4096).unwrap();
        assert!(cache.is_enabled());
        assert_eq!(cache.create(2), Err(ValidationError::CacheAlreadyActive));

        cache.destroy().unwrap();
        assert!(!cache.is_enabled());
        cache.create(2).unwrap();
        assert_eq!(cache.capacity(), 2);
    }

    #[test]
    fn recreate_keeps_old_cache_on_bad_capacity() {
        let mut cache = BlockCache::with_capacity(4).unwrap();
        cache.insert(1, 1, &filled(1)).unwrap();

        assert_eq!(cache.recreate(1), Err(ValidationError::InvalidCapacity(1)));
        assert!(cache.is_enabled());
        assert_eq!(cache.capacity(), 4);
        assert!(cache.contains(1, 1));

        cache.recreate(8).unwrap();
        assert_eq!(cache.capacity(), 8);
        assert!(cache.is_empty());

        let mut cache = BlockCache::new();
        cache.recreate(2).unwrap();
        assert!(cache.is_enabled());
    }

    #[test]
    fn destroy_resets_counters() {
        let mut cache = BlockCache::with_capacity(4).unwrap();
        let mut out = filled(0);
        cache.insert(0, 0, &filled(1)).unwrap();
        cache.lookup(0, 0, &mut out).unwrap();
        assert_eq!((cache.queries(), cache.hits()), (1, 1));

        cache.destroy().unwrap();
        assert_eq!((cache.queries(), cache.hits()), (0, 0));
        cache.create(4).unwrap();
        assert!(cache.is_empty());
    }

    #[test]
    fn lookup_of_unknown_block_misses() {
        let mut cache = BlockCache::with_capacity(8).unwrap();
        let mut out = filled(0xEE);
        assert_eq!(cache.lookup(3, 7, &mut out), Ok(CacheLookup::Miss));
        assert_eq!(cache.queries(), 1);
        assert_eq!(cache.hits(), 0);
        assert_eq!(out, filled(0xEE));
    }

    #[test]
    fn invalid_lookups_still_count_as_queries() {
        let mut cache = BlockCache::new();
        let mut out = filled(0);
        assert_eq!(
            cache.lookup(0, 0, &mut out),
            Err(ValidationError::CacheNotActive)
        );
        cache.create(2).unwrap();
        assert_eq!(cache.queries(), 1);
        assert_eq!(
            cache.lookup(16, 0, &mut out),
            Err(ValidationError::InvalidCoordinates { disk: 16, block: 0 })
        );
        assert_eq!(
            cache.lookup(0, 256, &mut out),
            Err(ValidationError::InvalidCoordinates { disk: 0, block: 256 })
        );
        assert_eq!(cache.queries(), 3);
        assert_eq!(cache.hits(), 0);
    }

    #[test]
    fn hit_copies_block_out() {
        let mut cache = BlockCache::with_capacity(2).unwrap();
        cache.insert(15, 255, &filled(9)).unwrap();
        let mut out = filled(0);
        assert_eq!(cache.lookup(15, 255, &mut out), Ok(CacheLookup::Hit));
        assert_eq!(out, filled(9));
        assert_eq!(cache.hit_rate(), Some(1.0));
    }

    #[test]
    fn overflow_evicts_exactly_the_oldest_entry() {
        let capacity = 5;
        let mut cache = BlockCache::with_capacity(capacity).unwrap();
        for i in 0..=capacity as u32 {
            cache.insert(i % 16, i, &filled(i as u8)).unwrap();
        }
        assert_eq!(cache.len(), capacity);

        let mut out = filled(0);
        assert_eq!(cache.lookup(0, 0, &mut out), Ok(CacheLookup::Miss));
        for i in 1..=capacity as u32 {
            assert_eq!(cache.lookup(i % 16, i, &mut out), Ok(CacheLookup::Hit));
            assert_eq!(out, filled(i as u8));
        }
    }

    #[test]
    fn lookup_makes_entry_most_recent() {
        let mut cache = BlockCache::with_capacity(2).unwrap();
        let mut out = filled(0);
        cache.insert(0, 1, &filled(1)).unwrap();
        cache.insert(0, 2, &filled(2)).unwrap();
        cache.lookup(0, 1, &mut out).unwrap();
        cache.insert(0, 3, &filled(3)).unwrap();

        assert!(cache.contains(0, 1));
        assert!(!cache.contains(0, 2));
        assert!(cache.contains(0, 3));
    }

    #[test]
    fn fresh_insert_is_not_next_victim() {
        let mut cache = BlockCache::with_capacity(3).unwrap();
        let mut out = filled(0);
        cache.insert(1, 1, &filled(1)).unwrap();
        cache.insert(1, 2, &filled(2)).unwrap();
        cache.lookup(1, 1, &mut out).unwrap();
        cache.lookup(1, 2, &mut out).unwrap();
        cache.insert(1, 3, &filled(3)).unwrap();
        cache.insert(1, 4, &filled(4)).unwrap();

        assert!(!cache.contains(1, 1));
        assert!(cache.contains(1, 2));
        assert!(cache.contains(1, 3));
        assert!(cache.contains(1, 4));
    }

    #[test]
    fn duplicate_insert_fails_without_touching_entry() {
        let mut cache = BlockCache::with_capacity(2).unwrap();
        cache.insert(2, 2, &filled(1)).unwrap();
        cache.insert(2, 3, &filled(2)).unwrap();
        assert_eq!(
            cache.insert(2, 2, &filled(0xFF)),
            Err(ValidationError::AlreadyCached { disk: 2, block: 2 })
        );

        // 2/2 的访问时间没被刷新，仍然最先被淘汰
        cache.insert(2, 4, &filled(3)).unwrap();
        assert!(!cache.contains(2, 2));
        assert!(cache.contains(2, 3));

        let mut cache = BlockCache::with_capacity(2).unwrap();
        cache.insert(2, 2, &filled(1)).unwrap();
        cache.insert(2, 2, &filled(0xFF)).unwrap_err();
        let mut out = filled(0);
        cache.lookup(2, 2, &mut out).unwrap();
        assert_eq!(out, filled(1));
    }

    #[test]
    fn insert_validates_arguments() {
        let mut cache = BlockCache::new();
        assert_eq!(
            cache.insert(0, 0, &filled(0)),
            Err(ValidationError::CacheNotActive)
        );
        cache.create(2).unwrap();
        assert_eq!(
            cache.insert(16, 0, &filled(0)),
            Err(ValidationError::InvalidCoordinates { disk: 16, block: 0 })
        );
        assert!(cache.is_empty());
    }

    #[test]
    fn update_overwrites_and_refreshes_only_existing_entries() {
        let mut cache = BlockCache::with_capacity(2).unwrap();
        cache.insert(4, 1, &filled(1)).unwrap();
        cache.insert(4, 2, &filled(2)).unwrap();
        cache.update(4, 1, &filled(7));
        cache.update(4, 9, &filled(9));
        assert!(!cache.contains(4, 9));

        cache.insert(4, 3, &filled(3)).unwrap();
        assert!(!cache.contains(4, 2));

        let mut out = filled(0);
        assert_eq!(cache.lookup(4, 1, &mut out), Ok(CacheLookup::Hit));
        assert_eq!(out, filled(7));
    }

    #[test]
    fn hit_rate_is_undefined_without_queries() {
        let mut cache = BlockCache::with_capacity(2).unwrap();
        assert_eq!(cache.hit_rate(), None);
        assert!(cache.hit_rate_report().contains("n/a"));

        let mut out = filled(0);
        cache.insert(0, 0, &filled(0)).unwrap();
        cache.lookup(0, 0, &mut out).unwrap();
        cache.lookup(0, 1, &mut out).unwrap();
        assert_eq!(cache.hit_rate(), Some(0.5));
        assert!(cache.hit_rate_report().contains("50.0%"));
    }
}
