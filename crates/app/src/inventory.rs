//! Inventory application service: the operational surface of the stock
//! ledger. Every mutation of `InventoryItem.quantity` funnels through here.

use chrono::{DateTime, Utc};

use gymops_core::{
    AdjustmentId, DomainError, DomainResult, ExpectedRevision, ItemId, OrderId, SaleId, SupplierId,
    UserId,
};
use gymops_inventory::{
    InventoryItem, ItemUpdate, NewAdjustment, NewItem, NewSupplier, OrderLine, OrderStatus,
    PaymentMethod, PurchaseOrder, Sale, SaleLine, StockAdjustment, Supplier,
};
use gymops_store::{Collection, UniqueIndex};

use crate::pagination::{paginate, Page, PageRequest};

/// Filters for the item list operation.
#[derive(Debug, Clone, Default)]
pub struct ItemListFilter {
    pub category: Option<String>,
    pub low_stock_only: bool,
}

/// Filters for the sales list operation (inclusive date range).
#[derive(Debug, Clone, Copy, Default)]
pub struct SaleListFilter {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

/// Inventory ledger service.
///
/// Collections plus the SKU / supplier uniqueness indexes. Per-entity
/// serialization comes from the collections' write locks and revision
/// checks; multi-line operations (sale, delivery restock) use batch updates
/// so they commit all-or-nothing.
#[derive(Debug, Default)]
pub struct InventoryService {
    items: Collection<ItemId, InventoryItem>,
    sku_index: UniqueIndex<String, ItemId>,
    suppliers: Collection<SupplierId, Supplier>,
    supplier_names: UniqueIndex<String, SupplierId>,
    supplier_emails: UniqueIndex<String, SupplierId>,
    orders: Collection<OrderId, PurchaseOrder>,
    sales: Collection<SaleId, Sale>,
    adjustments: Collection<AdjustmentId, StockAdjustment>,
}

impl InventoryService {
    pub fn new() -> Self {
        Self::default()
    }

    // --- items -----------------------------------------------------------

    pub fn create_item(&self, new: NewItem, now: DateTime<Utc>) -> DomainResult<InventoryItem> {
        if let Some(supplier_id) = new.supplier_id {
            self.suppliers.fetch(&supplier_id)?;
        }
        let id = ItemId::new();
        let item = InventoryItem::create(id, new, now)?;

        self.sku_index
            .claim(item.sku().to_string(), id)
            .map_err(|_| {
                DomainError::conflict(format!("an item with SKU '{}' already exists", item.sku()))
            })?;
        if let Err(e) = self.items.insert(id, item.clone()) {
            self.sku_index.release(&item.sku().to_string(), &id)?;
            return Err(e);
        }
        tracing::info!(item_id = %id, sku = item.sku(), "inventory item created");
        Ok(item)
    }

    pub fn get_item(&self, id: ItemId) -> DomainResult<InventoryItem> {
        Ok(self.items.fetch(&id)?.doc)
    }

    pub fn list_items(
        &self,
        filter: ItemListFilter,
        request: PageRequest,
    ) -> DomainResult<Page<InventoryItem>> {
        let mut items: Vec<_> = self
            .items
            .snapshot()?
            .into_iter()
            .filter(|item| {
                filter
                    .category
                    .as_deref()
                    .is_none_or(|c| item.category() == c)
                    && (!filter.low_stock_only || item.is_low_stock())
            })
            .collect();
        items.sort_by_key(|item| std::cmp::Reverse(item.created_at()));
        Ok(paginate(items, request))
    }

    pub fn update_item(&self, id: ItemId, update: ItemUpdate) -> DomainResult<InventoryItem> {
        if let Some(Some(supplier_id)) = update.supplier_id {
            self.suppliers.fetch(&supplier_id)?;
        }
        self.items.update(&id, ExpectedRevision::Any, |item| {
            if let Some(old_sku) = item.apply_update(update.clone())? {
                self.sku_index
                    .reclaim(&old_sku, item.sku().to_string(), id)
                    .map_err(|_| {
                        DomainError::conflict(format!(
                            "an item with SKU '{}' already exists",
                            item.sku()
                        ))
                    })?;
            }
            Ok(item.clone())
        })
    }

    pub fn delete_item(&self, id: ItemId) -> DomainResult<()> {
        let item = self.items.remove(&id)?;
        self.sku_index.release(&item.sku().to_string(), &id)?;
        tracing::info!(item_id = %id, sku = item.sku(), "inventory item deleted");
        Ok(())
    }

    // --- suppliers -------------------------------------------------------

    pub fn create_supplier(&self, new: NewSupplier, now: DateTime<Utc>) -> DomainResult<Supplier> {
        let id = SupplierId::new();
        let supplier = Supplier::create(id, new, now)?;

        self.supplier_names
            .claim(supplier.name().to_string(), id)
            .map_err(|_| {
                DomainError::conflict(format!("supplier '{}' already exists", supplier.name()))
            })?;
        if let Err(e) = self
            .supplier_emails
            .claim(supplier.email().to_string(), id)
            .map_err(|_| {
                DomainError::conflict(format!(
                    "a supplier with email '{}' already exists",
                    supplier.email()
                ))
            })
        {
            self.supplier_names.release(&supplier.name().to_string(), &id)?;
            return Err(e);
        }
        if let Err(e) = self.suppliers.insert(id, supplier.clone()) {
            self.supplier_names.release(&supplier.name().to_string(), &id)?;
            self.supplier_emails.release(&supplier.email().to_string(), &id)?;
            return Err(e);
        }
        Ok(supplier)
    }

    /// Retire a supplier. Existing orders keep their reference; the supplier
    /// stops appearing in listings and its name and email stay claimed.
    pub fn deactivate_supplier(&self, id: SupplierId) -> DomainResult<Supplier> {
        let supplier = self.suppliers.update(&id, ExpectedRevision::Any, |supplier| {
            supplier.deactivate();
            Ok(supplier.clone())
        })?;
        tracing::info!(supplier_id = %id, "supplier deactivated");
        Ok(supplier)
    }

    /// Active suppliers, sorted by name.
    pub fn list_suppliers(&self) -> DomainResult<Vec<Supplier>> {
        let mut suppliers: Vec<_> = self
            .suppliers
            .snapshot()?
            .into_iter()
            .filter(Supplier::is_active)
            .collect();
        suppliers.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(suppliers)
    }

    // --- purchase orders -------------------------------------------------

    pub fn create_purchase_order(
        &self,
        supplier_id: SupplierId,
        lines: Vec<OrderLine>,
        expected_delivery: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> DomainResult<PurchaseOrder> {
        self.suppliers.fetch(&supplier_id)?;
        for line in &lines {
            self.items.fetch(&line.item_id)?;
        }
        let id = OrderId::new();
        let order = PurchaseOrder::create(id, supplier_id, lines, expected_delivery, now)?;
        self.orders.insert(id, order.clone())?;
        tracing::info!(order_id = %id, total = order.total_amount(), "purchase order created");
        Ok(order)
    }

    pub fn get_purchase_order(&self, id: OrderId) -> DomainResult<PurchaseOrder> {
        Ok(self.orders.fetch(&id)?.doc)
    }

    pub fn list_purchase_orders(
        &self,
        status: Option<OrderStatus>,
        request: PageRequest,
    ) -> DomainResult<Page<PurchaseOrder>> {
        let mut orders: Vec<_> = self
            .orders
            .snapshot()?
            .into_iter()
            .filter(|o| status.is_none_or(|s| o.status() == s))
            .collect();
        orders.sort_by_key(|o| std::cmp::Reverse(o.ordered_at()));
        Ok(paginate(orders, request))
    }

    /// Move a purchase order to `next`.
    ///
    /// Entering `delivered` restocks every ordered line. The restock runs
    /// inside the order's conditional update: the status guard and the item
    /// increments commit together or not at all, so a retried delivery
    /// request fails on the guard and stock is incremented exactly once per
    /// order.
    pub fn transition_purchase_order(
        &self,
        id: OrderId,
        next: OrderStatus,
        now: DateTime<Utc>,
    ) -> DomainResult<PurchaseOrder> {
        let order = self.orders.update(&id, ExpectedRevision::Any, |order| {
            let restock = order.transition(next, now)?;
            if restock {
                let keys: Vec<ItemId> = order.lines().iter().map(|l| l.item_id).collect();
                let quantities: Vec<i64> = order.lines().iter().map(|l| l.quantity).collect();
                let mut idx = 0;
                self.items.update_batch(&keys, |_, item| {
                    let qty = quantities[idx];
                    idx += 1;
                    item.receive(qty)
                })?;
            }
            Ok(order.clone())
        })?;
        tracing::info!(order_id = %id, status = %order.status(), "purchase order transitioned");
        Ok(order)
    }

    // --- sales -----------------------------------------------------------

    /// Record a point-of-sale transaction.
    ///
    /// Every line is checked against current stock and decremented in one
    /// batch under the item collection's write lock: concurrent sales on the
    /// same item cannot both pass the check, and a failure on any line
    /// leaves every quantity untouched. Partial sales do not exist.
    pub fn create_sale(
        &self,
        customer_id: Option<UserId>,
        processed_by: UserId,
        lines: Vec<SaleLine>,
        payment_method: PaymentMethod,
        now: DateTime<Utc>,
    ) -> DomainResult<Sale> {
        let id = SaleId::new();
        let sale = Sale::create(id, customer_id, processed_by, lines, payment_method, now)?;

        let keys: Vec<ItemId> = sale.lines().iter().map(|l| l.item_id).collect();
        let quantities: Vec<i64> = sale.lines().iter().map(|l| l.quantity).collect();
        let mut idx = 0;
        self.items.update_batch(&keys, |_, item| {
            let qty = quantities[idx];
            idx += 1;
            item.deduct(qty)
        })?;

        if let Err(e) = self.sales.insert(id, sale.clone()) {
            // Put the stock back rather than leave a deduction with no sale.
            let mut idx = 0;
            self.items.update_batch(&keys, |_, item| {
                let qty = quantities[idx];
                idx += 1;
                item.receive(qty)
            })?;
            return Err(e);
        }
        tracing::info!(sale_id = %id, total = sale.total_amount(), "sale recorded");
        Ok(sale)
    }

    pub fn list_sales(
        &self,
        filter: SaleListFilter,
        request: PageRequest,
    ) -> DomainResult<Page<Sale>> {
        let mut sales: Vec<_> = self
            .sales
            .snapshot()?
            .into_iter()
            .filter(|s| {
                filter.from.is_none_or(|from| s.created_at() >= from)
                    && filter.to.is_none_or(|to| s.created_at() <= to)
            })
            .collect();
        sales.sort_by_key(|s| std::cmp::Reverse(s.created_at()));
        Ok(paginate(sales, request))
    }

    // --- adjustments -----------------------------------------------------

    /// Apply a manual stock correction and keep its audit record.
    ///
    /// A decrease that would take stock negative fails and writes nothing,
    /// neither the quantity nor the audit record.
    pub fn record_adjustment(
        &self,
        new: NewAdjustment,
        now: DateTime<Utc>,
    ) -> DomainResult<StockAdjustment> {
        let id = AdjustmentId::new();
        let adjustment = StockAdjustment::create(id, new, now)?;

        let item_id = adjustment.item_id();
        let delta = adjustment.signed_delta();
        self.items
            .update(&item_id, ExpectedRevision::Any, |item| item.apply_delta(delta))?;

        if let Err(e) = self.adjustments.insert(id, adjustment.clone()) {
            self.items
                .update(&item_id, ExpectedRevision::Any, |item| item.apply_delta(-delta))?;
            return Err(e);
        }
        tracing::info!(item_id = %item_id, delta, "stock adjustment recorded");
        Ok(adjustment)
    }

    pub fn list_adjustments(&self, item_id: ItemId) -> DomainResult<Vec<StockAdjustment>> {
        let mut adjustments: Vec<_> = self
            .adjustments
            .snapshot()?
            .into_iter()
            .filter(|a| a.item_id() == item_id)
            .collect();
        adjustments.sort_by_key(|a| std::cmp::Reverse(a.created_at()));
        Ok(adjustments)
    }
}
